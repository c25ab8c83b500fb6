//! Full lifecycle integration test

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use common::create_test_server;
use cookie::Cookie;
use serde_json::{json, Value};

/// Walk the whole account lifecycle through the HTTP surface:
/// register → login → authenticate → refresh → logout → refresh rejected.
#[tokio::test]
async fn test_full_session_lifecycle() {
    let server = create_test_server();

    // Health endpoints are unguarded
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let response = server.get("/readiness").await;
    assert_eq!(response.status_code(), 200);

    // Register
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "journey@test.com", "password": "p" }))
        .await;
    assert_eq!(response.status_code(), 201);

    // Login
    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "journey@test.com", "password": "p" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = response.cookie("refresh_token").value().to_string();

    // The access token guards protected routes
    let response = server
        .get("/api/v1/users/me")
        .add_header(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access)).unwrap(),
        )
        .await;
    assert_eq!(response.status_code(), 200);

    // Refresh rotates the pair
    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", refresh))
        .await;
    assert_eq!(response.status_code(), 200);
    let rotated = response.cookie("refresh_token").value().to_string();

    // Logout revokes the rotated token
    let response = server
        .post("/api/v1/auth/logout")
        .add_cookie(Cookie::new("refresh_token", rotated.clone()))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/api/v1/auth/refresh-access-token")
        .add_cookie(Cookie::new("refresh_token", rotated))
        .await;
    assert_eq!(response.status_code(), 401);
}
