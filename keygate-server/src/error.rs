//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use keygate_core::TokenError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Authentication failed: {0}")]
    Oauth(String),

    #[error("Google OAuth configuration error: {0}")]
    OauthConfig(String),

    #[error("Google initiation failed: {0}")]
    Initiation(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => ApiError::InvalidToken("expired".to_string()),
            TokenError::Invalid => ApiError::InvalidToken("malformed or forged".to_string()),
            TokenError::Signing(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            ApiError::UserAlreadyExists => (
                StatusCode::CONFLICT,
                "A user with this email already exists",
                None,
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
                None,
            ),
            ApiError::InvalidToken(reason) => {
                tracing::warn!(%reason, "Rejected token");
                (
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token",
                    Some(reason),
                )
            }
            ApiError::Oauth(reason) => (
                StatusCode::UNAUTHORIZED,
                "Authentication failed",
                Some(reason),
            ),
            ApiError::OauthConfig(reason) => {
                tracing::error!(%reason, "Google OAuth misconfiguration");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Google Initiation failed",
                    Some(reason),
                )
            }
            ApiError::Initiation(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Google Initiation failed",
                Some(reason),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found", None),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let errors = match detail {
            Some(detail) => json!({ "error": detail }),
            None => json!({}),
        };

        let body = json!({
            "status": "error",
            "status_code": status.as_u16(),
            "message": message,
            "errors": errors,
        });
        (status, axum::Json(body)).into_response()
    }
}
