//! Services for Gatehouse
//!
//! - `credentials`: builds the Turnkey client from configuration
//! - `login`: Google sign-in → sub-organization → session flow

pub mod credentials;
pub mod login;

pub use credentials::acquire_client;
pub use login::{generate_sub_org_name, LoginError, LoginService};
