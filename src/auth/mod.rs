//! Identity token handling for Gatehouse
//!
//! Provides:
//! - Claim extraction from Google ID tokens (no signature verification)

pub mod oidc;

pub use oidc::IdentityClaims;
