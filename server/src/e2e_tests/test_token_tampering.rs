//! Test that forged or altered tokens never pass the gate.

use axum::http::{Method, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::e2e_tests::helpers::TestApp;

#[tokio::test]
async fn test_escalated_role_in_payload_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.user("a@b.com").await;
    let parts: Vec<&str> = token.split('.').collect();

    let payload = URL_SAFE_NO_PAD.decode(parts[1]).expect("payload");
    let forged_payload = String::from_utf8(payload)
        .expect("utf8")
        .replace("\"role\":\"user\"", "\"role\":\"admin\"");
    let forged = format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(forged_payload),
        parts[2]
    );

    let (status, _) = app
        .send_with_token(Method::DELETE, "/api/v1/admin/users/1", &forged, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_alg_none_token_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.user("a@b.com").await;
    let payload = token.split('.').nth(1).unwrap_or_default();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);

    let (status, _) = app
        .send_with_token(
            Method::GET,
            "/api/v1/users",
            &format!("{header}.{payload}."),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
