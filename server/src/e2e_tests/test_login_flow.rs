//! Test registration and login end to end.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::auth::Role;
use crate::e2e_tests::helpers::TestApp;

#[tokio::test]
async fn test_register_then_login_returns_usable_token() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "a@b.com", "password": "secret123", "name": "Alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "a@b.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap_or_default();

    let claims = app.state.tokens.validate(token).expect("valid token");
    assert_eq!(claims.email, "a@b.com");
    assert_eq!(claims.role, Role::User);

    let (status, body) = app
        .send_with_token(Method::GET, "/api/v1/users", token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_register_ignores_requested_role() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "sneaky@b.com",
                "password": "secret123",
                "name": "Sneaky",
                "role": "admin"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new();
    app.register("a@b.com", "secret123").await;

    let (wrong_status, wrong_body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "a@b.com", "password": "not-it" })),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "nobody@b.com", "password": "secret123" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.register("a@b.com", "secret123").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "a@b.com", "password": "secret456", "name": "Again" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_bodies_are_bad_requests() {
    let app = TestApp::new();

    for body in [
        json!({ "email": "a@b.com" }),
        json!({ "email": "not-an-email", "password": "secret123", "name": "Al" }),
        json!({ "email": "a@b.com", "password": "123", "name": "Al" }),
        json!({ "email": "a@b.com", "password": "secret123", "name": "A" }),
    ] {
        let (status, response) = app
            .send(Method::POST, "/api/v1/auth/register", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert!(response["error"].is_string());
    }
}
