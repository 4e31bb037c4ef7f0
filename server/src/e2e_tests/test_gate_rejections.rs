//! Test that the gate rejects bad credentials before any handler runs.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::auth::{Principal, Role, TokenManager};
use crate::e2e_tests::helpers::TestApp;
use crate::time::TimeSource;

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/v1/users", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "authentication required" }));
}

#[tokio::test]
async fn test_wrong_scheme_is_bad_request() {
    let app = TestApp::new();
    let (_, token) = app.user("a@b.com").await;

    for header in [
        format!("bearer {token}"),
        format!("Token {token}"),
        format!("Bearer  {token}"),
        "Basic dXNlcjpwYXNz".to_string(),
        "Bearer".to_string(),
    ] {
        let (status, body) = app
            .send(Method::GET, "/api/v1/users", Some(&header), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "header {header:?}");
        assert_eq!(body, json!({ "error": "malformed authorization header" }));
    }
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app
        .send_with_token(Method::GET, "/api/v1/users", "garbage", None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "authentication required" }));
}

#[tokio::test]
async fn test_token_from_other_secret_is_unauthorized() {
    let app = TestApp::new();
    let foreign = TokenManager::new(
        b"some-other-secret",
        Arc::clone(&app.time) as Arc<dyn TimeSource>,
    )
    .expect("secret")
    .issue(
        &Principal::new(1, "a@b.com", Role::Admin),
        Duration::from_secs(3600),
    )
    .expect("issue");

    let (status, _) = app
        .send_with_token(Method::GET, "/api/v1/users", &foreign, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_route_without_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Method::DELETE, "/api/v1/admin/users/1", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
