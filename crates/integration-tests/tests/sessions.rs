//! Integration tests for `POST /sessions`.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`latchkey migrate`)
//! - The server running against it (`cargo run -p latchkey-server`)

use latchkey_integration_tests::{TestContext, unique_email};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn login(ctx: &TestContext, email: &str, password: &str) -> (StatusCode, Value) {
    let resp = ctx
        .client
        .post(ctx.url("/sessions"))
        .header("x-forwarded-for", &ctx.client_ip)
        .json(&json!({ "user": { "email": email, "password": password } }))
        .send()
        .await
        .expect("Failed to send request");

    let status = resp.status();
    let body = resp.json().await.expect("Response body is not JSON");
    (status, body)
}

fn invalid_body() -> Value {
    json!({ "error": "Invalid Email or password." })
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_valid_credentials_create_session() {
    let ctx = TestContext::new().await;
    let user = ctx.register("password").await;

    let (status, body) = login(&ctx, user.email.as_str(), "password").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["sign_in_count"], 1);

    let stored = ctx
        .store
        .get_by_email(user.email.as_str())
        .await
        .expect("query failed")
        .expect("user missing");
    assert_eq!(stored.sign_in_count, 1);
    assert!(stored.last_authenticated_at.is_some());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_wrong_password_leaves_user_untouched() {
    let ctx = TestContext::new().await;
    let user = ctx.register("password").await;

    for password in ["wrong_password", "almost"] {
        let (status, body) = login(&ctx, user.email.as_str(), password).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, invalid_body());
    }

    let stored = ctx
        .store
        .get_by_email(user.email.as_str())
        .await
        .expect("query failed")
        .expect("user missing");
    assert_eq!(stored.sign_in_count, 0);
    assert!(stored.last_authenticated_at.is_none());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unknown_email_is_not_registered() {
    let ctx = TestContext::new().await;
    let email = unique_email("unique_email");

    let (status, body) = login(&ctx, &email, "password").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, invalid_body());
    assert!(
        ctx.store
            .get_by_email(&email)
            .await
            .expect("query failed")
            .is_none()
    );
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_malformed_email_is_unauthorized() {
    let ctx = TestContext::new().await;

    let (status, body) = login(&ctx, "bad", "password").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, invalid_body());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_token_identifies_current_session() {
    let ctx = TestContext::new().await;
    let user = ctx.register("password").await;
    let (_, body) = login(&ctx, user.email.as_str(), "password").await;
    let token = body["token"].as_str().expect("token missing");

    let resp = ctx
        .client
        .get(ctx.url("/sessions/current"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::OK);
    let current: Value = resp.json().await.expect("Response body is not JSON");
    assert_eq!(current["email"], user.email.as_str());
    assert_eq!(current["id"], user.id.as_i32());
}
