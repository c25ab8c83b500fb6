//! Common test utilities for server integration tests

use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use keygate_server::{
    routes, ApiError, AppState, Config, InMemoryRevocationLedger, InMemoryUserStore, OauthProvider,
};
use serde_json::{json, Value};

/// Mock provider returning canned claims instead of calling Google
pub struct MockOauth {
    pub claims: Value,
}

impl MockOauth {
    pub fn new(claims: Value) -> Self {
        Self { claims }
    }
}

#[async_trait]
impl OauthProvider for MockOauth {
    fn authorization_url(&self, state: &str) -> Result<String, ApiError> {
        Ok(format!("https://accounts.example.com/auth?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ApiError> {
        if code == "bad-code" {
            return Err(ApiError::Oauth(
                "Failed to exchange authorization code".to_string(),
            ));
        }
        Ok(format!("id-token-for-{}", code))
    }

    async fn fetch_claims(&self, _id_token: &str) -> Result<Value, ApiError> {
        Ok(self.claims.clone())
    }
}

pub fn test_config() -> Config {
    Config {
        access_secret: "access-secret-for-tests".to_string(),
        refresh_secret: "refresh-secret-for-tests".to_string(),
        ..Config::default()
    }
}

/// Create a test server over in-memory stores with the given provider claims
pub fn create_test_server_with(claims: Value) -> TestServer {
    let config = test_config();
    let tokens = config.token_engine();

    let state = Arc::new(AppState::new(
        config,
        tokens,
        InMemoryUserStore::new(),
        InMemoryRevocationLedger::new(),
        Some(MockOauth::new(claims)),
    ));

    TestServer::new(routes::create_router(state)).expect("Failed to create test server")
}

/// Create a test server with default federated claims
pub fn create_test_server() -> TestServer {
    create_test_server_with(json!({ "email": "federated@example.com", "sub": "999" }))
}

/// Register a user and return (access token, refresh cookie value)
pub async fn register_user(server: &TestServer, email: &str, password: &str) -> (String, String) {
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    let access = body["data"]["access_token"]
        .as_str()
        .expect("No access token in body")
        .to_string();
    let refresh = response
        .maybe_cookie("refresh_token")
        .expect("No refresh cookie")
        .value()
        .to_string();

    (access, refresh)
}
