//! Shared types for Gatehouse

pub mod error;

pub use error::{GatehouseError, Result};
