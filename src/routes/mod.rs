//! HTTP routes for Gatehouse

pub mod auth_routes;
pub mod cors;
pub mod health;

pub use auth_routes::{handle_auth_request, LOGIN_FAILED};
pub use cors::{apply_cors, preflight_response};
pub use health::health_check;
