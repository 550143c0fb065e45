//! End-to-end tests for POST /auth/snsLogin over a real listener

use std::sync::Arc;

use clap::Parser;
use gatehouse::config::Args;
use gatehouse::turnkey::{CustodyProvider, MockProvider};
use gatehouse::{serve, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Start a server on an ephemeral port and return its base URL
async fn spawn_server(provider: Option<Arc<MockProvider>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let args = Args::try_parse_from(["gatehouse"]).unwrap();
    let provider = provider.map(|p| p as Arc<dyn CustodyProvider>);
    let state = Arc::new(AppState::new(args, provider));

    tokio::spawn(async move {
        let _ = serve(listener, state).await;
    });

    format!("http://{}", addr)
}

/// Mint a Google-shaped ID token carrying `claims`
fn id_token(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"not-verified-by-gatehouse"),
    )
    .unwrap()
}

async fn post_login(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/auth/snsLogin", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let json = response.json().await.unwrap();
    (status, json)
}

fn login_body(token: &str, key: &str) -> Value {
    json!({ "oidcToken": token, "indexedDbClientPublicKey": key })
}

fn failed() -> Value {
    json!({ "error": "Failed to login" })
}

#[tokio::test]
async fn test_first_login_creates_sub_org() {
    let provider = Arc::new(MockProvider::new());
    let base = spawn_server(Some(Arc::clone(&provider))).await;

    // Claims segment must be exactly eyJlbWFpbCI6ImFAYi5jb20ifQ
    let token = "eyJhbGciOiJSUzI1NiJ9.eyJlbWFpbCI6ImFAYi5jb20ifQ.c2ln";
    let (status, body) = post_login(&base, login_body(token, "02browser")).await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "session": MockProvider::session_for("mock-suborg-1", "02browser") })
    );
    assert_eq!(provider.lookup_count(), 1);
    assert_eq!(provider.create_count(), 1);
    assert_eq!(provider.login_count(), 1);
    assert_eq!(provider.created_requests()[0].root_users[0].user_email, "a@b.com");
}

#[tokio::test]
async fn test_returning_login_reuses_sub_org() {
    let provider = Arc::new(MockProvider::new());
    let base = spawn_server(Some(Arc::clone(&provider))).await;
    let token = id_token(json!({ "email": "user@example.com", "name": "User", "sub": "1234" }));

    let (first_status, first) = post_login(&base, login_body(&token, "02first")).await;
    let (second_status, second) = post_login(&base, login_body(&token, "02second")).await;

    assert_eq!(first_status, 200);
    assert_eq!(second_status, 200);
    assert_eq!(first["session"]["organizationId"], second["session"]["organizationId"]);
    assert_eq!(second["session"]["publicKey"], "02second");

    assert_eq!(provider.lookup_count(), 2);
    assert_eq!(provider.create_count(), 1);
    assert_eq!(provider.login_count(), 2);
    assert_eq!(provider.created_requests()[0].root_users[0].user_name, "User");
}

#[tokio::test]
async fn test_previously_seen_token_skips_create() {
    let token = id_token(json!({ "email": "user@example.com" }));
    let provider = Arc::new(MockProvider::new().with_sub_org(token.clone(), "existing-sub"));
    let base = spawn_server(Some(Arc::clone(&provider))).await;

    let (status, body) = post_login(&base, login_body(&token, "02browser")).await;

    assert_eq!(status, 200);
    assert_eq!(body["session"]["organizationId"], "existing-sub");
    assert_eq!(provider.create_count(), 0);
    assert_eq!(provider.login_count(), 1);
}

#[tokio::test]
async fn test_session_passed_through_unchanged() {
    let provider = Arc::new(MockProvider::new().with_sub_org("a.b.c", "sub-x"));
    let base = spawn_server(Some(Arc::clone(&provider))).await;

    let (status, body) = post_login(&base, login_body("a.b.c", "02key")).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "session": MockProvider::session_for("sub-x", "02key") }));
}

#[tokio::test]
async fn test_malformed_claims_without_tenant_fails() {
    let provider = Arc::new(MockProvider::new());
    let base = spawn_server(Some(Arc::clone(&provider))).await;

    let (status, body) = post_login(&base, login_body("header.@@not-base64@@.sig", "02browser")).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
    assert_eq!(provider.lookup_count(), 1);
    assert_eq!(provider.create_count(), 0);
    assert_eq!(provider.login_count(), 0);
}

#[tokio::test]
async fn test_missing_email_claim_fails() {
    let provider = Arc::new(MockProvider::new());
    let base = spawn_server(Some(Arc::clone(&provider))).await;
    let token = id_token(json!({ "name": "No Email", "sub": "42" }));

    let (status, body) = post_login(&base, login_body(&token, "02browser")).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
    assert_eq!(provider.create_count(), 0);
}

#[tokio::test]
async fn test_unconfigured_provider_fails() {
    let base = spawn_server(None).await;
    let token = id_token(json!({ "email": "user@example.com" }));

    let (status, body) = post_login(&base, login_body(&token, "02browser")).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
}

#[tokio::test]
async fn test_create_without_id_fails() {
    let provider = Arc::new(MockProvider::new().with_create_returns_id(false));
    let base = spawn_server(Some(Arc::clone(&provider))).await;
    let token = id_token(json!({ "email": "user@example.com" }));

    let (status, body) = post_login(&base, login_body(&token, "02browser")).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
    assert_eq!(provider.login_count(), 0);
}

#[tokio::test]
async fn test_missing_session_fails() {
    let provider = Arc::new(MockProvider::new().with_login_returns_session(false));
    let base = spawn_server(Some(Arc::clone(&provider))).await;
    let token = id_token(json!({ "email": "user@example.com" }));

    let (status, body) = post_login(&base, login_body(&token, "02browser")).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
}

#[tokio::test]
async fn test_provider_fault_fails() {
    let provider = Arc::new(MockProvider::new().with_unreachable(true));
    let base = spawn_server(Some(Arc::clone(&provider))).await;
    let token = id_token(json!({ "email": "user@example.com" }));

    let (status, body) = post_login(&base, login_body(&token, "02browser")).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
}

#[tokio::test]
async fn test_missing_fields_fail_without_provider_calls() {
    let provider = Arc::new(MockProvider::new());
    let base = spawn_server(Some(Arc::clone(&provider))).await;

    let (status, body) = post_login(&base, json!({ "oidcToken": "a.b.c" })).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
    assert_eq!(provider.lookup_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_fails_without_provider_calls() {
    let provider = Arc::new(MockProvider::new());
    let base = spawn_server(Some(Arc::clone(&provider))).await;
    let token = id_token(json!({ "email": "user@example.com", "pad": "x".repeat(32 * 1024) }));

    let (status, body) = post_login(&base, login_body(&token, "02browser")).await;

    assert_eq!(status, 400);
    assert_eq!(body, failed());
    assert_eq!(provider.lookup_count(), 0);
}

#[tokio::test]
async fn test_cors_headers_on_login() {
    let base = spawn_server(None).await;

    let response = reqwest::Client::new()
        .post(format!("{}/auth/snsLogin", base))
        .header("Origin", "https://app.example.com")
        .json(&login_body("a.b.c", "02browser"))
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_preflight_and_health() {
    let base = spawn_server(None).await;
    let client = reqwest::Client::new();

    let preflight = client
        .request(reqwest::Method::OPTIONS, format!("{}/auth/snsLogin", base))
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status().as_u16(), 204);

    // Same policy outside /auth
    let other = client
        .request(reqwest::Method::OPTIONS, format!("{}/health", base))
        .send()
        .await
        .unwrap();
    assert_eq!(other.status().as_u16(), 204);
    for name in [
        "access-control-allow-origin",
        "access-control-allow-methods",
        "access-control-allow-headers",
        "access-control-max-age",
    ] {
        assert_eq!(preflight.headers().get(name), other.headers().get(name), "{}", name);
    }

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["healthy"], true);
    assert_eq!(health["providerConfigured"], false);

    let missing = client.get(format!("{}/nope", base)).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}
