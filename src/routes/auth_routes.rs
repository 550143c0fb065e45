//! HTTP Routes for Authentication
//!
//! - POST /auth/snsLogin - Exchange a Google ID token for a Turnkey session
//!
//! Every login failure, whatever its cause, is answered with
//! `400 {"error": "Failed to login"}`. The cause is only logged.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::warn;

use super::cors::{apply_cors, preflight_response};
use crate::server::AppState;
use crate::services::LoginError;
use crate::types::GatehouseError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Client-facing message for every login failure
pub const LOGIN_FAILED: &str = "Failed to login";

/// Upper bound on login request bodies
const MAX_BODY_BYTES: usize = 16 * 1024;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnsLoginRequest {
    /// Google-issued ID token
    pub oidc_token: String,
    /// Public key of the browser's IndexedDB-held key pair
    pub indexed_db_client_public_key: String,
}

impl SnsLoginRequest {
    /// Reject requests with blank fields before any provider call.
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.oidc_token.trim().is_empty() {
            return Err(LoginError::InvalidRequest("oidcToken is empty".into()));
        }
        if self.indexed_db_client_public_key.trim().is_empty() {
            return Err(LoginError::InvalidRequest(
                "indexedDbClientPublicKey is empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: JsonValue,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Response Helpers
// =============================================================================

fn with_cors(mut response: Response<BoxBody>) -> Response<BoxBody> {
    apply_cors(response.headers_mut());
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_cors(response)
}

fn error_response(status: StatusCode, message: &str) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: message.to_string(),
        },
    )
}

fn login_failed() -> Response<BoxBody> {
    error_response(StatusCode::BAD_REQUEST, LOGIN_FAILED)
}

fn cors_preflight() -> Response<BoxBody> {
    preflight_response().map(|body| body.map_err(|never| match never {}).boxed())
}

fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, GatehouseError>
where
    T: for<'de> Deserialize<'de>,
    B: Body,
    B::Error: Into<BoxError>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                GatehouseError::BadRequest("Request body too large".into())
            } else {
                GatehouseError::Http(format!("Failed to read body: {}", e))
            }
        })?;

    Ok(serde_json::from_slice(&body.to_bytes())?)
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /auth/snsLogin
///
/// Flow:
/// 1. Parse and validate `{oidcToken, indexedDbClientPublicKey}`
/// 2. Find or create the sub-organization bound to the token
/// 3. Return `{session}` from the session exchange
async fn handle_sns_login<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: SnsLoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            warn!("Rejected login request: {}", e);
            return login_failed();
        }
    };

    if let Err(e) = body.validate() {
        warn!("Rejected login request: {}", e);
        return login_failed();
    }

    match state
        .login
        .login(&body.oidc_token, &body.indexed_db_client_public_key)
        .await
    {
        Ok(session) => json_response(StatusCode::OK, &SessionResponse { session }),
        Err(_) => login_failed(),
    }
}

// =============================================================================
// Main Router
// =============================================================================

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if request was handled, None if not an auth route.
pub async fn handle_auth_request<B>(req: Request<B>, state: Arc<AppState>) -> Option<Response<BoxBody>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path.starts_with("/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/auth/snsLogin") => handle_sns_login(req, state).await,

        (_, "/auth/snsLogin") => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),

        _ => error_response(StatusCode::NOT_FOUND, "Auth endpoint not found"),
    };

    Some(response)
}
