//! Test reading and updating users through the protected routes.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::e2e_tests::helpers::TestApp;

#[tokio::test]
async fn test_get_user_by_id() {
    let app = TestApp::new();
    let (id, token) = app.user("a@b.com").await;

    let (status, body) = app
        .send_with_token(Method::GET, &format!("/api/v1/users/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id);

    let (status, _) = app
        .send_with_token(Method::GET, "/api/v1/users/999", &token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send_with_token(Method::GET, "/api/v1/users/abc", &token, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid user id");
}

#[tokio::test]
async fn test_user_updates_own_profile() {
    let app = TestApp::new();
    let (id, token) = app.user("a@b.com").await;

    let (status, body) = app
        .send_with_token(
            Method::PUT,
            &format!("/api/v1/users/{id}"),
            &token,
            Some(json!({ "name": "Renamed", "password": "brand-new-pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Renamed");

    app.login("a@b.com", "brand-new-pw").await;
}

#[tokio::test]
async fn test_user_cannot_update_others_or_self_promote() {
    let app = TestApp::new();
    let (me, token) = app.user("a@b.com").await;
    let (other, _) = app.user("c@d.com").await;

    let (status, _) = app
        .send_with_token(
            Method::PUT,
            &format!("/api/v1/users/{other}"),
            &token,
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send_with_token(
            Method::PUT,
            &format!("/api/v1/users/{me}"),
            &token,
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_deactivates_user() {
    let app = TestApp::new();
    let (id, _) = app.user("a@b.com").await;
    let (_, admin_token) = app.admin().await;

    let (status, body) = app
        .send_with_token(
            Method::PUT,
            &format!("/api/v1/users/{id}"),
            &admin_token,
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_active"], false);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "a@b.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_to_taken_email_conflicts() {
    let app = TestApp::new();
    let (id, token) = app.user("a@b.com").await;
    app.user("c@d.com").await;

    let (status, _) = app
        .send_with_token(
            Method::PUT,
            &format!("/api/v1/users/{id}"),
            &token,
            Some(json!({ "email": "c@d.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
