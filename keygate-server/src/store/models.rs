//! User records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an account was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
    Facebook,
    Twitter,
    Github,
    Apple,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
            AuthProvider::Facebook => "facebook",
            AuthProvider::Twitter => "twitter",
            AuthProvider::Github => "github",
            AuthProvider::Apple => "apple",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local" => Some(AuthProvider::Local),
            "google" => Some(AuthProvider::Google),
            "facebook" => Some(AuthProvider::Facebook),
            "twitter" => Some(AuthProvider::Twitter),
            "github" => Some(AuthProvider::Github),
            "apple" => Some(AuthProvider::Apple),
            _ => None,
        }
    }
}

/// A user account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Stored lowercased; unique across non-deleted accounts
    pub email: String,
    /// None for provider-only accounts
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superadmin: bool,
    pub is_deleted: bool,
    pub auth_provider: AuthProvider,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: Option<String>,
        auth_provider: AuthProvider,
        is_verified: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            is_active: true,
            is_verified,
            is_superadmin: false,
            is_deleted: false,
            auth_provider,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Public projection of a user for response bodies.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub uuid: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superadmin: bool,
    pub is_verified: bool,
    pub is_deleted: bool,
    pub auth_provider: AuthProvider,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            uuid: user.id,
            email: user.email.clone(),
            is_active: user.is_active,
            is_superadmin: user.is_superadmin,
            is_verified: user.is_verified,
            is_deleted: user.is_deleted,
            auth_provider: user.auth_provider,
            created_at: user.created_at,
        }
    }
}
