//! Health check endpoint
//!
//! Liveness probe: /health, /healthz. Returns 200 whenever the process is
//! serving, and reports whether Turnkey credentials were loaded.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use super::cors::apply_cors;
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Whether a Turnkey client is available for logins
    pub provider_configured: bool,
    pub timestamp: String,
}

/// Liveness probe
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let body = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        provider_configured: state.login.is_configured(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let json = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    apply_cors(headers);
    response
}
