//! Google sign-in login flow
//!
//! Binds a browser-held public key to a Turnkey session:
//!
//! 1. Look up sub-organizations bound to the Google ID token
//! 2. If none, create one whose root user is the token's email/name
//! 3. Exchange token + sub-organization + public key for a session
//!
//! Calls are strictly sequential and never retried. Every failure is logged
//! where it is detected and returned as a [`LoginError`].

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::auth::IdentityClaims;
use crate::turnkey::{
    CreateSubOrgRequest, CustodyProvider, OauthLoginRequest, ProviderError, RootUser,
    SubOrgFilter,
};

/// Root quorum threshold for new sub-organizations
pub const ROOT_QUORUM_THRESHOLD: u32 = 1;

/// Reasons a login can fail. All of them reach the client as the same
/// generic error.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Turnkey client is not configured")]
    ConfigurationMissing,

    #[error("Identity token has no email claim")]
    MissingEmailClaim,

    #[error("Sub-organization creation returned no id")]
    TenantCreateFailure,

    #[error("Session exchange returned no session")]
    SessionExchangeFailure,

    #[error("Invalid login request: {0}")]
    InvalidRequest(String),

    #[error("Turnkey call failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Orchestrates sub-organization lookup/creation and session exchange.
#[derive(Clone)]
pub struct LoginService {
    provider: Option<Arc<dyn CustodyProvider>>,
}

impl LoginService {
    pub fn new(provider: Option<Arc<dyn CustodyProvider>>) -> Self {
        Self { provider }
    }

    /// Whether a provider client is available
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Log in with a Google ID token, returning the provider's session as-is.
    pub async fn login(&self, oidc_token: &str, client_public_key: &str) -> Result<JsonValue, LoginError> {
        let Some(provider) = self.provider.as_deref() else {
            error!("Failed to create Turnkey client");
            return Err(LoginError::ConfigurationMissing);
        };

        let sub_org_id = match find_sub_org(provider, oidc_token).await? {
            Some(id) => id,
            None => create_sub_org(provider, oidc_token).await?,
        };

        let response = provider
            .oauth_login(OauthLoginRequest {
                organization_id: sub_org_id.clone(),
                public_key: client_public_key.to_string(),
                oidc_token: oidc_token.to_string(),
            })
            .await
            .map_err(|e| {
                error!(sub_org_id = %sub_org_id, "Session exchange failed: {}", e);
                LoginError::from(e)
            })?;

        match response.session {
            Some(session) if !session.is_null() => {
                info!(sub_org_id = %sub_org_id, "Session issued");
                Ok(session)
            }
            _ => {
                error!(sub_org_id = %sub_org_id, "Failed to issue / refresh session");
                Err(LoginError::SessionExchangeFailure)
            }
        }
    }
}

/// First sub-organization bound to the token, in provider order.
async fn find_sub_org(provider: &dyn CustodyProvider, oidc_token: &str) -> Result<Option<String>, LoginError> {
    let ids = provider
        .get_sub_org_ids(SubOrgFilter::oidc_token(oidc_token))
        .await
        .map_err(|e| {
            error!("Sub-organization lookup failed: {}", e);
            LoginError::from(e)
        })?;

    if ids.len() > 1 {
        debug!(matches = ids.len(), "Multiple sub-organizations match token, using first");
    }

    Ok(ids.into_iter().next())
}

/// Create a sub-organization for a first-time Google account.
async fn create_sub_org(provider: &dyn CustodyProvider, oidc_token: &str) -> Result<String, LoginError> {
    let claims = IdentityClaims::decode(oidc_token);

    let Some(email) = claims.email() else {
        if claims.is_empty() {
            warn!("Google ID-token claims could not be decoded");
        } else {
            warn!("Google ID-token is missing email claim");
        }
        return Err(LoginError::MissingEmailClaim);
    };
    let user_name = claims.display_name().unwrap_or(email);

    let request = CreateSubOrgRequest {
        sub_organization_name: generate_sub_org_name(),
        root_quorum_threshold: ROOT_QUORUM_THRESHOLD,
        root_users: vec![RootUser::google(user_name, email, oidc_token)],
    };
    let name = request.sub_organization_name.clone();

    let response = provider.create_sub_organization(request).await.map_err(|e| {
        error!(name = %name, "Failed to create sub-organization: {}", e);
        LoginError::from(e)
    })?;

    match response.sub_organization_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            info!(sub_org_id = %id, name = %name, "Created sub-organization");
            Ok(id)
        }
        None => {
            error!(name = %name, "Failed to create sub-organization: no id returned");
            Err(LoginError::TenantCreateFailure)
        }
    }
}

/// Unique sub-organization name: millisecond timestamp plus a random UUID.
pub fn generate_sub_org_name() -> String {
    format!(
        "suborg-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}
