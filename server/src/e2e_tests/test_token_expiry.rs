//! Test that tokens stop working once the clock passes their expiry.

use axum::http::{Method, StatusCode};

use crate::e2e_tests::helpers::TestApp;

#[tokio::test]
async fn test_token_expires_after_ttl() {
    let app = TestApp::new();
    let (_, token) = app.user("a@b.com").await;

    app.time.advance(3599);
    let (status, _) = app
        .send_with_token(Method::GET, "/api/v1/users", &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    app.time.advance(1);
    let (status, body) = app
        .send_with_token(Method::GET, "/api/v1/users", &token, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");
}

#[tokio::test]
async fn test_relogin_after_expiry_issues_fresh_token() {
    let app = TestApp::new();
    let (_, token) = app.user("a@b.com").await;

    app.time.advance(7200);
    let fresh = app.login("a@b.com", "secret123").await;
    assert_ne!(fresh, token);

    let (status, _) = app
        .send_with_token(Method::GET, "/api/v1/users", &fresh, None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
