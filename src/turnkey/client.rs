//! Turnkey API client.
//!
//! Speaks the public v1 HTTP API. Each call is a stamped JSON POST; activity
//! endpoints return an activity envelope whose `result` carries the payload.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::stamp::{ApiKeyStamper, STAMP_HEADER};
use super::traits::*;
use crate::config::ProviderCredentials;

const LIST_SUB_ORGS_PATH: &str = "/public/v1/query/list_suborgs";
const CREATE_SUB_ORG_PATH: &str = "/public/v1/submit/create_sub_organization";
const OAUTH_LOGIN_PATH: &str = "/public/v1/submit/oauth_login";

const CREATE_SUB_ORG_ACTIVITY: &str = "ACTIVITY_TYPE_CREATE_SUB_ORGANIZATION_V7";
const OAUTH_LOGIN_ACTIVITY: &str = "ACTIVITY_TYPE_OAUTH_LOGIN";

const ACTIVITY_STATUS_COMPLETED: &str = "ACTIVITY_STATUS_COMPLETED";

/// Turnkey API client bound to one API key and root organization.
pub struct TurnkeyClient {
    client: Client,
    base_url: String,
    organization_id: String,
    stamper: ApiKeyStamper,
}

impl TurnkeyClient {
    /// Create a client from loaded credentials.
    ///
    /// No network call is made; the key material is only parsed.
    pub fn new(credentials: &ProviderCredentials) -> Result<Self, ProviderError> {
        let stamper = ApiKeyStamper::new(
            &credentials.api_private_key,
            credentials.api_public_key.clone(),
        )?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(credentials.request_timeout)
            .user_agent(concat!("gatehouse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: credentials.api_base_url.clone(),
            organization_id: credentials.organization_id.clone(),
            stamper,
        })
    }

    /// Root organization this client acts for
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stamp and POST `body` to `path`, decoding the JSON response.
    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, ProviderError> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| ProviderError::Parse(format!("Request serialization failed: {}", e)))?;
        let stamp = self.stamper.stamp(&payload)?;
        let url = format!("{}{}", self.base_url, path);

        debug!(url = %url, "Turnkey request");

        let response = self
            .client
            .post(&url)
            .header(STAMP_HEADER, stamp)
            .body(payload)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "Turnkey request rejected");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Submit an activity and return its `result` object.
    async fn submit_activity<P: Serialize>(
        &self,
        path: &str,
        activity_type: &str,
        organization_id: &str,
        parameters: P,
    ) -> Result<JsonValue, ProviderError> {
        let request = ActivityRequest {
            activity_type,
            timestamp_ms: chrono::Utc::now().timestamp_millis().to_string(),
            organization_id,
            parameters,
        };

        let envelope: ActivityEnvelope = self.post(path, &request).await?;
        let activity = envelope.activity;

        if activity.status != ACTIVITY_STATUS_COMPLETED {
            return Err(ProviderError::Activity {
                activity_id: activity.id,
                status: activity.status,
            });
        }

        Ok(activity.result.unwrap_or(JsonValue::Null))
    }
}

/// Activity submission body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRequest<'a, P> {
    #[serde(rename = "type")]
    activity_type: &'a str,
    timestamp_ms: String,
    organization_id: &'a str,
    parameters: P,
}

#[derive(Debug, Deserialize)]
struct ActivityEnvelope {
    activity: Activity,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(default)]
    id: String,
    status: String,
    #[serde(default)]
    result: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListSubOrgsRequest<'a> {
    organization_id: &'a str,
    filter_type: FilterType,
    filter_value: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSubOrgsResponse {
    #[serde(default)]
    organization_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OauthLoginParameters<'a> {
    oidc_token: &'a str,
    public_key: &'a str,
}

/// Pull `result.<key>` out of an activity result as `T`, or `T::default()`.
fn activity_result<T: DeserializeOwned + Default>(result: JsonValue, key: &str) -> Result<T, ProviderError> {
    match result.get(key) {
        Some(inner) => serde_json::from_value(inner.clone())
            .map_err(|e| ProviderError::Parse(format!("Malformed {}: {}", key, e))),
        None => Ok(T::default()),
    }
}

#[async_trait]
impl CustodyProvider for TurnkeyClient {
    async fn get_sub_org_ids(&self, filter: SubOrgFilter) -> Result<Vec<String>, ProviderError> {
        let request = ListSubOrgsRequest {
            organization_id: &self.organization_id,
            filter_type: filter.filter_type,
            filter_value: &filter.filter_value,
        };

        let response: ListSubOrgsResponse = self.post(LIST_SUB_ORGS_PATH, &request).await?;
        Ok(response.organization_ids)
    }

    async fn create_sub_organization(
        &self,
        request: CreateSubOrgRequest,
    ) -> Result<CreateSubOrgResponse, ProviderError> {
        let result = self
            .submit_activity(
                CREATE_SUB_ORG_PATH,
                CREATE_SUB_ORG_ACTIVITY,
                &self.organization_id,
                &request,
            )
            .await?;

        activity_result(result, "createSubOrganizationResultV7")
    }

    async fn oauth_login(&self, request: OauthLoginRequest) -> Result<OauthLoginResponse, ProviderError> {
        let parameters = OauthLoginParameters {
            oidc_token: &request.oidc_token,
            public_key: &request.public_key,
        };

        let result = self
            .submit_activity(
                OAUTH_LOGIN_PATH,
                OAUTH_LOGIN_ACTIVITY,
                &request.organization_id,
                parameters,
            )
            .await?;

        activity_result(result, "oauthLoginResult")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use zeroize::Zeroizing;

    fn credentials() -> ProviderCredentials {
        ProviderCredentials {
            api_private_key: Zeroizing::new("01".repeat(32)),
            api_public_key: "02abcdef".into(),
            organization_id: "org-root".into(),
            api_base_url: "https://api.turnkey.com".into(),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = TurnkeyClient::new(&credentials()).unwrap();
        assert_eq!(client.organization_id(), "org-root");
        assert_eq!(client.base_url(), "https://api.turnkey.com");
    }

    #[test]
    fn test_client_rejects_bad_key() {
        let mut creds = credentials();
        creds.api_private_key = Zeroizing::new("zz".into());
        assert!(TurnkeyClient::new(&creds).is_err());
    }

    #[test]
    fn test_activity_request_shape() {
        let request = ActivityRequest {
            activity_type: OAUTH_LOGIN_ACTIVITY,
            timestamp_ms: "1700000000000".into(),
            organization_id: "suborg-1",
            parameters: OauthLoginParameters {
                oidc_token: "tok",
                public_key: "pk",
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "type": "ACTIVITY_TYPE_OAUTH_LOGIN",
                "timestampMs": "1700000000000",
                "organizationId": "suborg-1",
                "parameters": { "oidcToken": "tok", "publicKey": "pk" }
            })
        );
    }

    #[test]
    fn test_activity_result_missing_key_defaults() {
        let parsed: OauthLoginResponse = activity_result(json!({}), "oauthLoginResult").unwrap();
        assert!(parsed.session.is_none());

        let parsed: CreateSubOrgResponse = activity_result(
            json!({ "createSubOrganizationResultV7": { "subOrganizationId": "sub-1" } }),
            "createSubOrganizationResultV7",
        )
        .unwrap();
        assert_eq!(parsed.sub_organization_id.as_deref(), Some("sub-1"));
    }
}
