//! Test role-based access to admin routes.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::e2e_tests::helpers::TestApp;

#[tokio::test]
async fn test_user_role_cannot_reach_admin_route() {
    let app = TestApp::new();
    let (id, token) = app.user("a@b.com").await;

    let (status, body) = app
        .send_with_token(
            Method::DELETE,
            &format!("/api/v1/admin/users/{id}"),
            &token,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "insufficient permissions" }));

    // The handler never ran.
    let (status, _) = app
        .send_with_token(Method::GET, &format!("/api/v1/users/{id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_role_reaches_handler() {
    let app = TestApp::new();
    let (victim, _) = app.user("a@b.com").await;
    let (_, admin_token) = app.admin().await;

    let (status, body) = app
        .send_with_token(
            Method::DELETE,
            &format!("/api/v1/admin/users/{victim}"),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "user deleted");

    let (status, _) = app
        .send_with_token(
            Method::GET,
            &format!("/api/v1/users/{victim}"),
            &admin_token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_delete_unknown_user_is_not_found() {
    let app = TestApp::new();
    let (_, admin_token) = app.admin().await;

    let (status, _) = app
        .send_with_token(Method::DELETE, "/api/v1/admin/users/999", &admin_token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promoted_user_needs_new_token() {
    let app = TestApp::new();
    let (id, old_token) = app.user("a@b.com").await;
    let (_, admin_token) = app.admin().await;

    let (status, _) = app
        .send_with_token(
            Method::PUT,
            &format!("/api/v1/users/{id}"),
            &admin_token,
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Claims are fixed at issue time; the old token still says "user".
    let (status, _) = app
        .send_with_token(Method::DELETE, "/api/v1/admin/users/999", &old_token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let new_token = app.login("a@b.com", "secret123").await;
    let (status, _) = app
        .send_with_token(Method::DELETE, "/api/v1/admin/users/999", &new_token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
