//! Mock custody provider for testing.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::*;

/// In-memory provider.
///
/// Sub-organizations are indexed by the OIDC token of their root user's OAuth
/// binding, so a second login with the same token finds the first one's
/// sub-organization.
pub struct MockProvider {
    sub_orgs: DashMap<String, Vec<String>>,
    created: Mutex<Vec<CreateSubOrgRequest>>,
    logins: Mutex<Vec<OauthLoginRequest>>,
    lookup_count: AtomicU32,
    create_count: AtomicU32,
    login_count: AtomicU32,
    create_returns_id: AtomicBool,
    login_returns_session: AtomicBool,
    unreachable: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            sub_orgs: DashMap::new(),
            created: Mutex::new(Vec::new()),
            logins: Mutex::new(Vec::new()),
            lookup_count: AtomicU32::new(0),
            create_count: AtomicU32::new(0),
            login_count: AtomicU32::new(0),
            create_returns_id: AtomicBool::new(true),
            login_returns_session: AtomicBool::new(true),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Pre-register a sub-organization for `oidc_token`.
    pub fn with_sub_org(self, oidc_token: impl Into<String>, sub_org_id: impl Into<String>) -> Self {
        self.sub_orgs
            .entry(oidc_token.into())
            .or_default()
            .push(sub_org_id.into());
        self
    }

    /// Make creation succeed without returning an id.
    pub fn with_create_returns_id(self, returns_id: bool) -> Self {
        self.create_returns_id.store(returns_id, Ordering::SeqCst);
        self
    }

    /// Make session exchange answer without a session.
    pub fn with_login_returns_session(self, returns_session: bool) -> Self {
        self.login_returns_session.store(returns_session, Ordering::SeqCst);
        self
    }

    /// Make every call fail with a network error.
    pub fn with_unreachable(self, unreachable: bool) -> Self {
        self.unreachable.store(unreachable, Ordering::SeqCst);
        self
    }

    pub fn lookup_count(&self) -> u32 {
        self.lookup_count.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> u32 {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn login_count(&self) -> u32 {
        self.login_count.load(Ordering::SeqCst)
    }

    /// Creation requests received, in order
    pub fn created_requests(&self) -> Vec<CreateSubOrgRequest> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Session exchange requests received, in order
    pub fn login_requests(&self) -> Vec<OauthLoginRequest> {
        self.logins.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Session value the mock issues for a sub-organization and public key
    pub fn session_for(sub_org_id: &str, public_key: &str) -> JsonValue {
        json!({
            "organizationId": sub_org_id,
            "publicKey": public_key,
            "token": format!("session-{}", sub_org_id),
        })
    }

    fn check_reachable(&self) -> Result<(), ProviderError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("Mock provider unreachable".to_string()));
        }
        Ok(())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustodyProvider for MockProvider {
    async fn get_sub_org_ids(&self, filter: SubOrgFilter) -> Result<Vec<String>, ProviderError> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        if filter.filter_type != FilterType::OidcToken {
            return Ok(Vec::new());
        }

        Ok(self
            .sub_orgs
            .get(&filter.filter_value)
            .map(|ids| ids.clone())
            .unwrap_or_default())
    }

    async fn create_sub_organization(
        &self,
        request: CreateSubOrgRequest,
    ) -> Result<CreateSubOrgResponse, ProviderError> {
        let n = self.create_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.check_reachable()?;

        if let Ok(mut created) = self.created.lock() {
            created.push(request.clone());
        }

        if !self.create_returns_id.load(Ordering::SeqCst) {
            return Ok(CreateSubOrgResponse::default());
        }

        let sub_org_id = format!("mock-suborg-{}", n);
        for user in &request.root_users {
            for binding in &user.oauth_providers {
                self.sub_orgs
                    .entry(binding.oidc_token.clone())
                    .or_default()
                    .push(sub_org_id.clone());
            }
        }

        Ok(CreateSubOrgResponse {
            sub_organization_id: Some(sub_org_id),
        })
    }

    async fn oauth_login(&self, request: OauthLoginRequest) -> Result<OauthLoginResponse, ProviderError> {
        self.login_count.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        if let Ok(mut logins) = self.logins.lock() {
            logins.push(request.clone());
        }

        if !self.login_returns_session.load(Ordering::SeqCst) {
            return Ok(OauthLoginResponse::default());
        }

        Ok(OauthLoginResponse {
            session: Some(Self::session_for(&request.organization_id, &request.public_key)),
        })
    }
}
