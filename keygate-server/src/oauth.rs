//! Google OAuth boundary
//!
//! The network roundtrips (code exchange, ID-token introspection) live
//! behind a trait so login flows can be exercised without Google.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{Environment, GoogleConfig};
use crate::error::ApiError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TOKENINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/tokeninfo";

/// Network seam to the external identity provider
#[async_trait]
pub trait OauthProvider: Send + Sync {
    /// Build the provider consent URL carrying our signed state
    fn authorization_url(&self, state: &str) -> Result<String, ApiError>;

    /// Exchange an authorization code for an ID token
    async fn exchange_code(&self, code: &str) -> Result<String, ApiError>;

    /// Introspect an ID token into identity claims
    async fn fetch_claims(&self, id_token: &str) -> Result<Value, ApiError>;
}

/// Google implementation over reqwest
pub struct GoogleOauth {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleOauth {
    pub fn new(config: GoogleConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl OauthProvider for GoogleOauth {
    fn authorization_url(&self, state: &str) -> Result<String, ApiError> {
        let url = reqwest::Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Oauth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::Oauth(
                "Failed to exchange authorization code".to_string(),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Oauth(e.to_string()))?;
        body.get("id_token")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| ApiError::Oauth("provider response carried no id_token".to_string()))
    }

    async fn fetch_claims(&self, id_token: &str) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| ApiError::Oauth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::Oauth("Invalid ID token".to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Oauth(e.to_string()))
    }
}

/// Lifetime of the `state` parameter: long enough for the consent screen,
/// short enough that a leaked value is soon worthless.
const STATE_TTL_MINUTES: i64 = 10;

/// Signed OAuth `state`: a nonce plus the explicit environment the flow
/// started from, carried as a short-lived HS256 token rather than a string
/// the callback would have to substring-match.
#[derive(Debug, Serialize, Deserialize)]
pub struct OauthState {
    pub nonce: String,
    pub env: Environment,
    pub exp: i64,
}

impl OauthState {
    pub fn new(env: Environment) -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(22)
            .map(char::from)
            .collect();
        Self {
            nonce,
            env,
            exp: (Utc::now() + chrono::Duration::minutes(STATE_TTL_MINUTES)).timestamp(),
        }
    }

    pub fn encode(&self, secret: &[u8]) -> Result<String, ApiError> {
        jsonwebtoken::encode(&Header::default(), self, &EncodingKey::from_secret(secret))
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// The environment carried by a state value, if it verifies and has not
    /// expired.
    pub fn decode(state: &str, secret: &[u8]) -> Option<Environment> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<OauthState>(state, &DecodingKey::from_secret(secret), &validation)
            .ok()
            .map(|data| data.claims.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        let state = OauthState::new(Environment::Staging);
        let encoded = state.encode(b"app-secret").unwrap();

        assert_eq!(
            OauthState::decode(&encoded, b"app-secret"),
            Some(Environment::Staging)
        );
    }

    #[test]
    fn test_state_rejects_wrong_secret_and_garbage() {
        let encoded = OauthState::new(Environment::Local)
            .encode(b"app-secret")
            .unwrap();

        assert_eq!(OauthState::decode(&encoded, b"other-secret"), None);
        assert_eq!(OauthState::decode("local", b"app-secret"), None);
        assert_eq!(OauthState::decode("", b"app-secret"), None);
    }

    #[test]
    fn test_authorization_url_carries_state() {
        let google = GoogleOauth::new(GoogleConfig {
            client_id: "1234.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://api.keygate.dev/api/v1/oauth/google/callback".to_string(),
        })
        .unwrap();

        let url = google.authorization_url("signed-state").unwrap();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("state=signed-state"));
        assert!(url.contains("response_type=code"));
    }
}
