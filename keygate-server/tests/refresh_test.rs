//! Tests for refresh-token rotation

mod common;

use common::{create_test_server, register_user};
use cookie::Cookie;
use serde_json::Value;

/// Test: refreshing returns a new access token and rotates the cookie
#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let server = create_test_server();
    let (_, refresh) = register_user(&server, "rotate@test.com", "password").await;

    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", refresh.clone()))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Tokens refreshed successfully");
    assert!(body["data"]["access_token"]["token"].as_str().is_some());
    assert_eq!(body["data"]["access_token"]["token_type"], "access");

    let rotated = response.cookie("refresh_token");
    assert_ne!(rotated.value(), refresh);
}

/// Test: refresh without a cookie fails with 401
#[tokio::test]
async fn test_refresh_without_cookie() {
    let server = create_test_server();

    let response = server.post("/api/v1/auth/refresh-access-token").await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid or expired token");
}

/// Test: a rotated-out refresh token is revoked even though its signature
/// and expiry are still valid
#[tokio::test]
async fn test_old_refresh_token_rejected_after_rotation() {
    let server = create_test_server();
    let (_, first) = register_user(&server, "replay@test.com", "password").await;

    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", first.clone()))
        .await;
    assert_eq!(response.status_code(), 200);
    let second = response.cookie("refresh_token").value().to_string();

    // Replaying the first token must fail
    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", first))
        .await;
    assert_eq!(response.status_code(), 401);

    // The replacement keeps working
    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", second))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Test: a forged cookie value fails verification
#[tokio::test]
async fn test_refresh_with_garbage_cookie() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", "not-a-real-token"))
        .await;

    assert_eq!(response.status_code(), 401);
}

/// Test: an access token in the refresh cookie is rejected; the kinds are
/// signed with different secrets
#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let server = create_test_server();
    let (access, _) = register_user(&server, "kinds@test.com", "password").await;

    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", access))
        .await;

    assert_eq!(response.status_code(), 401);
}
