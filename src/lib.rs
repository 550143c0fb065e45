//! Gatehouse - Google sign-in gateway for Turnkey
//!
//! Binds a browser-held key to a Turnkey session. A Google ID token is used
//! to find (or create) the user's Turnkey sub-organization, and the token,
//! sub-organization and browser public key are then exchanged for a session.
//!
//! ## Modules
//!
//! - **auth**: Google ID token claim extraction
//! - **turnkey**: Custody provider trait, Turnkey HTTP client, request stamping
//! - **services**: Credential bootstrap and the login flow
//! - **routes** / **server**: `POST /auth/snsLogin` over hyper

pub mod auth;
pub mod config;
pub mod routes;
pub mod server;
pub mod services;
pub mod turnkey;
pub mod types;

pub use config::Args;
pub use server::{run, serve, AppState};
pub use types::{GatehouseError, Result};
