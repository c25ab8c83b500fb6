//! Server configuration
//!
//! Everything is resolved from the environment once at startup and carried
//! in an explicit struct; nothing reads the environment after boot.

use std::str::FromStr;

use chrono::Duration;
use keygate_core::TokenEngine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment environment, carried in the signed OAuth `state` parameter
/// so the callback knows which frontend started the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Staging,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" | "dev" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(ConfigError::Invalid {
                name: "environment",
                reason: format!("unknown environment {:?}", other),
            }),
        }
    }
}

/// Google OAuth client settings
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl GoogleConfig {
    /// Offline format checks, run at startup so a misconfigured deployment
    /// fails before the first login attempt reaches Google.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_ID"));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET"));
        }
        if !valid_client_id(&self.client_id) {
            return Err(ConfigError::Invalid {
                name: "GOOGLE_CLIENT_ID",
                reason: "expected <digits-and-dashes>.apps.googleusercontent.com".to_string(),
            });
        }
        if !self.redirect_uri.starts_with("http://") && !self.redirect_uri.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "GOOGLE_REDIRECT_URI",
                reason: "must be an http(s) URI".to_string(),
            });
        }
        Ok(())
    }
}

fn valid_client_id(id: &str) -> bool {
    match id.strip_suffix(".apps.googleusercontent.com") {
        Some(prefix) => !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit() || c == '-'),
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Environment this process serves
    pub env: Environment,

    /// Port to listen on
    pub port: u16,

    /// SQLite database path; in-memory stores when unset
    pub database: Option<String>,

    /// Signing secret for access tokens (also signs the OAuth state)
    pub access_secret: String,

    /// Signing secret for refresh tokens, distinct from the access secret
    pub refresh_secret: String,

    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,

    /// Lifetime of the refresh cookie handed to browsers
    pub refresh_cookie_days: i64,

    pub local_frontend_url: String,
    pub staging_frontend_url: String,
    pub prod_frontend_url: String,

    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,

    /// Google OAuth settings; federated login is disabled when absent
    pub google: Option<GoogleConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let google = match std::env::var("GOOGLE_CLIENT_ID") {
            Ok(client_id) => Some(GoogleConfig {
                client_id,
                client_secret: require("GOOGLE_CLIENT_SECRET")?,
                redirect_uri: require("GOOGLE_REDIRECT_URI")?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            env: env_or("KEYGATE_ENV", "local").parse()?,
            port: env_or("PORT", "3000")
                .parse()
                .map_err(|e| ConfigError::Invalid {
                    name: "PORT",
                    reason: format!("{}", e),
                })?,
            database: std::env::var("DATABASE_PATH").ok(),
            access_secret: require("ACCESS_SECRET_KEY")?,
            refresh_secret: require("REFRESH_SECRET_KEY")?,
            access_ttl_minutes: parse_env("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_ttl_minutes: parse_env("REFRESH_TOKEN_EXPIRE_MINUTES", 60 * 24 * 7)?,
            refresh_cookie_days: parse_env("REFRESH_COOKIE_DAYS", 60)?,
            local_frontend_url: env_or("LOCAL_FRONTEND_URL", "http://localhost:3000"),
            staging_frontend_url: env_or("STAGING_FRONTEND_URL", "https://staging.keygate.dev"),
            prod_frontend_url: env_or("PROD_FRONTEND_URL", "https://keygate.dev"),
            allowed_origins: env_or("ALLOWED_ORIGINS", "http://localhost:3000")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            google,
        })
    }

    /// Frontend a browser flow should land on for the given environment.
    pub fn frontend_url(&self, env: Environment) -> &str {
        match env {
            Environment::Local => &self.local_frontend_url,
            Environment::Staging => &self.staging_frontend_url,
            Environment::Prod => &self.prod_frontend_url,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::minutes(self.refresh_ttl_minutes)
    }

    /// Build the token engine from the configured secrets and lifetimes.
    pub fn token_engine(&self) -> TokenEngine {
        TokenEngine::new(
            self.access_secret.as_bytes(),
            self.refresh_secret.as_bytes(),
            self.access_ttl(),
            self.refresh_ttl(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: Environment::Local,
            port: 3000,
            database: None,
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_ttl_minutes: 30,
            refresh_ttl_minutes: 60 * 24 * 7,
            refresh_cookie_days: 60,
            local_frontend_url: "http://localhost:3000".to_string(),
            staging_frontend_url: "https://staging.keygate.dev".to_string(),
            prod_frontend_url: "https://keygate.dev".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            google: None,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_env(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map_err(|e| ConfigError::Invalid {
            name: key,
            reason: format!("{}", e),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("localhost".parse::<Environment>().is_err());
    }

    #[test]
    fn test_google_client_id_format() {
        assert!(valid_client_id("1234-5678.apps.googleusercontent.com"));
        assert!(!valid_client_id("1234-5678.apps.example.com"));
        assert!(!valid_client_id("abc.apps.googleusercontent.com"));
        assert!(!valid_client_id(".apps.googleusercontent.com"));
    }

    #[test]
    fn test_google_config_validation() {
        let config = GoogleConfig {
            client_id: "1234.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://api.keygate.dev/api/v1/oauth/google/callback".to_string(),
        };
        assert!(config.validate().is_ok());

        let bad_uri = GoogleConfig {
            redirect_uri: "ftp://nope".to_string(),
            ..config.clone()
        };
        assert!(bad_uri.validate().is_err());
    }
}
