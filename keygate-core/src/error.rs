//! Error types for keygate-core

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(pub String);
