//! Core traits for the custody provider.
//!
//! `CustodyProvider` is the capability handle the login flow talks to. The
//! production implementation is [`super::TurnkeyClient`]; tests use
//! [`super::MockProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// OAuth provider name attached to root users created from Google sign-in
pub const GOOGLE_PROVIDER_NAME: &str = "Google";

/// Error types for provider calls.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("Request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request could not be signed
    #[error("Stamp error: {0}")]
    Stamp(String),

    /// Activity did not reach a completed state
    #[error("Activity {activity_id} ended in status {status}")]
    Activity { activity_id: String, status: String },
}

/// Filter applied when listing sub-organizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    Email,
    PhoneNumber,
    OidcToken,
    PublicKey,
}

/// Sub-organization lookup request
#[derive(Debug, Clone)]
pub struct SubOrgFilter {
    pub filter_type: FilterType,
    pub filter_value: String,
}

impl SubOrgFilter {
    pub fn oidc_token(token: impl Into<String>) -> Self {
        Self {
            filter_type: FilterType::OidcToken,
            filter_value: token.into(),
        }
    }
}

/// OAuth binding for a root user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OauthProviderParams {
    pub provider_name: String,
    pub oidc_token: String,
}

/// Root user of a new sub-organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootUser {
    pub user_name: String,
    pub user_email: String,
    pub api_keys: Vec<JsonValue>,
    pub authenticators: Vec<JsonValue>,
    pub oauth_providers: Vec<OauthProviderParams>,
}

impl RootUser {
    /// Root user authenticated only through a Google OAuth binding
    pub fn google(user_name: impl Into<String>, email: impl Into<String>, oidc_token: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user_email: email.into(),
            api_keys: Vec::new(),
            authenticators: Vec::new(),
            oauth_providers: vec![OauthProviderParams {
                provider_name: GOOGLE_PROVIDER_NAME.to_string(),
                oidc_token: oidc_token.into(),
            }],
        }
    }
}

/// Sub-organization creation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubOrgRequest {
    pub sub_organization_name: String,
    pub root_quorum_threshold: u32,
    pub root_users: Vec<RootUser>,
}

/// Result of sub-organization creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubOrgResponse {
    #[serde(default)]
    pub sub_organization_id: Option<String>,
}

/// Session exchange parameters
#[derive(Debug, Clone, PartialEq)]
pub struct OauthLoginRequest {
    /// Sub-organization the session is issued for
    pub organization_id: String,
    /// Browser-held public key the session is bound to
    pub public_key: String,
    pub oidc_token: String,
}

/// Result of a session exchange. The session itself is opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OauthLoginResponse {
    #[serde(default)]
    pub session: Option<JsonValue>,
}

/// Capability handle for the custody provider.
#[async_trait]
pub trait CustodyProvider: Send + Sync {
    /// List sub-organization ids matching `filter`, in provider order.
    async fn get_sub_org_ids(&self, filter: SubOrgFilter) -> Result<Vec<String>, ProviderError>;

    /// Create a sub-organization under the root organization.
    async fn create_sub_organization(
        &self,
        request: CreateSubOrgRequest,
    ) -> Result<CreateSubOrgResponse, ProviderError>;

    /// Exchange an identity token for a session bound to a public key.
    async fn oauth_login(&self, request: OauthLoginRequest) -> Result<OauthLoginResponse, ProviderError>;
}
