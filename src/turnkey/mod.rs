//! Turnkey custody provider.
//!
//! Provides a trait-based interface to the provider's three capabilities
//! (sub-organization lookup, sub-organization creation, OAuth session
//! exchange):
//! - `TurnkeyClient` for the Turnkey HTTP API
//! - `MockProvider` for testing

pub mod client;
pub mod mock;
pub mod stamp;
pub mod traits;

pub use client::TurnkeyClient;
pub use mock::MockProvider;
pub use stamp::{ApiKeyStamper, STAMP_HEADER};
pub use traits::{
    CreateSubOrgRequest, CreateSubOrgResponse, CustodyProvider, FilterType, OauthLoginRequest,
    OauthLoginResponse, OauthProviderParams, ProviderError, RootUser, SubOrgFilter,
    GOOGLE_PROVIDER_NAME,
};
