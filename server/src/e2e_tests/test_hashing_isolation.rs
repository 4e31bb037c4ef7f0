//! Test that slow password hashing never holds up token checks.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::auth::{Principal, Role};
use crate::e2e_tests::helpers::TestApp;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_token_check_not_blocked_by_registrations() {
    // One hashing permit and a deliberately heavy cost.
    let app = Arc::new(TestApp::with_hashing("4", "16384", "1"));
    let token = app
        .state
        .tokens
        .issue(
            &Principal::new(1, "reader@b.com", Role::User),
            Duration::from_secs(3600),
        )
        .expect("issue");

    let registrations: Vec<_> = (0..3)
        .map(|i| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                app.send(
                    Method::POST,
                    "/api/v1/auth/register",
                    None,
                    Some(json!({
                        "email": format!("burst{i}@b.com"),
                        "password": "secret123",
                        "name": "Burst"
                    })),
                )
                .await
                .0
            })
        })
        .collect();

    // Let the first registration take the permit.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (status, _) = tokio::time::timeout(
        Duration::from_secs(1),
        app.send_with_token(Method::GET, "/api/v1/users", &token, None),
    )
    .await
    .expect("token check finished while hashing was busy");
    assert_eq!(status, StatusCode::OK);
    assert!(
        registrations.iter().any(|handle| !handle.is_finished()),
        "registrations should still be queued behind the single permit"
    );

    for registration in registrations {
        assert_eq!(registration.await.expect("join"), StatusCode::CREATED);
    }
}
