//! Federated identity reconciliation

use std::sync::Arc;

use serde_json::Value;

use crate::error::ApiError;
use crate::store::{AuthProvider, User, UserStore};

/// Maps a verified external identity onto a local account, provisioning one
/// on first login.
pub struct Reconciler<U> {
    users: Arc<U>,
    provider: AuthProvider,
}

impl<U: UserStore> Reconciler<U> {
    pub fn new(users: Arc<U>, provider: AuthProvider) -> Self {
        Self { users, provider }
    }

    /// Resolve provider claims to a local user, creating a verified
    /// passwordless account when none exists. Returns the user and whether
    /// this call created it.
    pub fn resolve_or_create(&self, claims: &Value) -> Result<(User, bool), ApiError> {
        let email = self
            .resolve_email(claims)
            .ok_or_else(|| ApiError::Oauth("no email or subject in provider claims".to_string()))?;

        if let Some(user) = self.users.find_by_email(&email)? {
            return Ok((user, false));
        }

        match self
            .users
            .insert(User::new(email.clone(), None, self.provider, true))
        {
            Ok(user) => {
                tracing::info!(
                    user = %user.id,
                    provider = self.provider.as_str(),
                    "provisioned account from federated login"
                );
                Ok((user, true))
            }
            // Two first logins racing: the loser picks up the winner's row.
            Err(ApiError::UserAlreadyExists) => {
                let user = self.users.find_by_email(&email)?.ok_or_else(|| {
                    ApiError::Internal("user vanished after conflicting insert".to_string())
                })?;
                Ok((user, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Providers are inconsistent in claim shape between the ID-token
    /// introspection and userinfo formats; try each known location, then
    /// fall back to a placeholder address derived from the subject id.
    fn resolve_email(&self, claims: &Value) -> Option<String> {
        if let Some(email) = claims.get("email").and_then(Value::as_str) {
            return Some(email.to_lowercase());
        }
        if let Some(email) = claims.pointer("/payload/email").and_then(Value::as_str) {
            return Some(email.to_lowercase());
        }
        if let Some(email) = claims.pointer("/emails/0/value").and_then(Value::as_str) {
            return Some(email.to_lowercase());
        }
        claims
            .get("sub")
            .and_then(Value::as_str)
            .map(|sub| format!("{}@placeholder.{}.com", sub, self.provider.as_str()))
    }
}
