use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};

use skypipe_auth::infra::captcha::{Captcha, DisabledCaptcha};
use skypipe_auth::infra::mailer::{LogMailer, Mailer};
use skypipe_auth::infra::registry::ConnectionRegistry;
use skypipe_auth::router::build_router;
use skypipe_auth::state::AppState;

use crate::helpers::test_policy;

/// Server whose backends are never reached: every request here is answered
/// before a repository is touched.
fn server() -> TestServer {
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:6379")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let state = AppState {
        db: sea_orm::DatabaseConnection::Disconnected,
        redis,
        mailer: Mailer::Log(LogMailer),
        captcha: Captcha::Disabled(DisabledCaptcha),
        registry: ConnectionRegistry::new(),
        policy: test_policy(5),
    };
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn should_answer_liveness_probe() {
    let resp = server().get("/healthz").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert_eq!(resp.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn should_require_bearer_token_for_me() {
    let resp = server().get("/api/v1/users/me").await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<Value>()["error"], "Authorization token missing");
}

#[tokio::test]
async fn should_reject_malformed_bearer_header() {
    let resp = server()
        .post("/api/v1/auth/change-password")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static("Token abc"),
        )
        .json(&json!({ "old_password": "a", "new_password": "b" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.json::<Value>()["error"],
        "token format must be 'Bearer <token>'"
    );
}

#[tokio::test]
async fn should_require_refresh_headers() {
    let resp = server().post("/api/v1/auth/refresh-access-token").await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    let body = resp.json::<Value>();
    assert_eq!(body["status"]["code"], 401);
    assert_eq!(body["error"], "MISSING_REFRESH_HEADERS");
}

#[tokio::test]
async fn should_reject_refresh_token_without_bearer_scheme() {
    let resp = server()
        .post("/api/v1/auth/refresh-access-token")
        .add_header(
            HeaderName::from_static("x-rtoken-id"),
            HeaderValue::from_static("raw-token"),
        )
        .add_header(
            HeaderName::from_static("x-client-id"),
            HeaderValue::from_static("00000000-0000-0000-0000-000000000001"),
        )
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<Value>()["error"], "INVALID_REFRESH_HEADER");
}

#[tokio::test]
async fn should_validate_login_body_before_lookup() {
    let resp = server()
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "nope", "password": "whatever-long" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let body = resp.json::<Value>();
    assert_eq!(body["status"]["code"], 400);
    assert_eq!(body["error"], "VALIDATION");
}

#[tokio::test]
async fn should_validate_register_body_before_lookup() {
    let resp = server()
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Grace",
            "email": "grace@example.com",
            "password": "short",
            "plan_id": "00000000-0000-0000-0000-0000000000aa",
            "full_name": "Grace Hopper",
            "phone": "+1 555 0100 200"
        }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>()["error"], "VALIDATION");
}

#[tokio::test]
async fn should_reject_socket_without_token() {
    let resp = server().get("/ws").await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<Value>()["error"], "Authorization token missing");
}
