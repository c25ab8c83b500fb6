//! Session orchestration
//!
//! Ties the token engine, the user store and the revocation ledger together
//! for login, refresh and logout. Holds no per-request state; everything
//! durable lives in the injected stores.

use std::sync::Arc;

use keygate_core::{password, TokenEngine, TokenKind};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{AuthProvider, RevocationLedger, User, UserStore};

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Outcome of a credential or federated login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

/// Session orchestrator, constructed once at startup with its collaborators.
pub struct Sessions<U, L> {
    tokens: Arc<TokenEngine>,
    users: Arc<U>,
    revoked: Arc<L>,
}

impl<U, L> Sessions<U, L>
where
    U: UserStore,
    L: RevocationLedger,
{
    pub fn new(tokens: Arc<TokenEngine>, users: Arc<U>, revoked: Arc<L>) -> Self {
        Self {
            tokens,
            users,
            revoked,
        }
    }

    /// Register a new local account and start a session.
    pub fn register(&self, email: &str, password_plain: &str) -> Result<AuthSession, ApiError> {
        let email = email.to_lowercase();
        if self.users.find_by_email(&email)?.is_some() {
            return Err(ApiError::UserAlreadyExists);
        }

        let hash = password::hash(password_plain).map_err(|e| ApiError::Internal(e.to_string()))?;

        // The store re-checks uniqueness on write; a concurrent registration
        // losing the race surfaces here as UserAlreadyExists.
        let user = self
            .users
            .insert(User::new(email, Some(hash), AuthProvider::Local, false))?;

        tracing::info!(user = %user.id, "user registered");
        let tokens = self.issue_pair(user.id)?;
        Ok(AuthSession { user, tokens })
    }

    /// Authenticate with email and password and start a session.
    pub fn login(&self, email: &str, password_plain: &str) -> Result<AuthSession, ApiError> {
        let user = self
            .users
            .find_by_email(email)?
            .ok_or(ApiError::InvalidCredentials)?;

        let valid = user
            .password_hash
            .as_deref()
            .map(|hash| password::verify(password_plain, hash))
            .unwrap_or(false);
        if !valid {
            return Err(ApiError::InvalidCredentials);
        }

        tracing::info!(user = %user.id, "user logged in");
        let tokens = self.issue_pair(user.id)?;
        Ok(AuthSession { user, tokens })
    }

    /// Start a session for an already-resolved user (federated login).
    pub fn for_user(&self, user: User) -> Result<AuthSession, ApiError> {
        let tokens = self.issue_pair(user.id)?;
        Ok(AuthSession { user, tokens })
    }

    /// Rotate a refresh token into a fresh access/refresh pair.
    ///
    /// Both checks are required: verification alone cannot see a logout,
    /// and the ledger alone cannot see expiry or forgery.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;

        if !self.revoked.is_active(refresh_token)? {
            return Err(ApiError::InvalidToken("revoked".to_string()));
        }

        // Rotation: the presented token is revoked for the rest of its
        // lifetime before the replacement is handed out.
        self.revoked.blacklist(refresh_token, claims.remaining())?;

        self.issue_pair(claims.sub)
    }

    /// Revoke the refresh token, if one was presented. Succeeds either way.
    pub fn logout(&self, refresh_token: Option<&str>) -> Result<(), ApiError> {
        if let Some(token) = refresh_token {
            // An unverifiable token can never be honored, so there is
            // nothing to revoke and no reason to fail the logout.
            if let Ok(claims) = self.tokens.verify(token, TokenKind::Refresh) {
                self.revoked.blacklist(token, claims.remaining())?;
                tracing::info!(user = %claims.sub, "refresh token blacklisted");
            }
        }
        Ok(())
    }

    /// Resolve the bearer access token on a protected request to a user.
    pub fn authenticate(&self, access_token: &str) -> Result<User, ApiError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        self.users
            .find_by_id(claims.sub)?
            .ok_or_else(|| ApiError::InvalidToken("unknown subject".to_string()))
    }

    fn issue_pair(&self, subject: Uuid) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access: self.tokens.issue(subject, TokenKind::Access)?,
            refresh: self.tokens.issue(subject, TokenKind::Refresh)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryRevocationLedger, InMemoryUserStore};
    use chrono::Duration;

    fn sessions() -> Sessions<InMemoryUserStore, InMemoryRevocationLedger> {
        let tokens = TokenEngine::new(
            b"access-secret",
            b"refresh-secret",
            Duration::minutes(30),
            Duration::days(7),
        );
        Sessions::new(
            Arc::new(tokens),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryRevocationLedger::new()),
        )
    }

    #[test]
    fn test_register_then_login() {
        let sessions = sessions();

        let registered = sessions.register("user@test.com", "hunter2").unwrap();
        assert!(!registered.user.is_verified);
        assert_eq!(registered.user.auth_provider, AuthProvider::Local);

        let logged_in = sessions.login("user@test.com", "hunter2").unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        assert!(matches!(
            sessions.login("user@test.com", "wrong"),
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            sessions.login("nobody@test.com", "hunter2"),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_register_duplicate() {
        let sessions = sessions();

        sessions.register("dup@test.com", "hunter2").unwrap();
        assert!(matches!(
            sessions.register("dup@test.com", "other"),
            Err(ApiError::UserAlreadyExists)
        ));
    }

    #[test]
    fn test_login_rejected_for_passwordless_account() {
        let sessions = sessions();

        // Federated accounts carry no password hash
        sessions
            .users
            .insert(User::new(
                "federated@test.com".to_string(),
                None,
                AuthProvider::Google,
                true,
            ))
            .unwrap();

        assert!(matches!(
            sessions.login("federated@test.com", "anything"),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_refresh_rotates_and_revokes() {
        let sessions = sessions();

        let session = sessions.register("rotate@test.com", "hunter2").unwrap();
        let first = session.tokens.refresh.clone();

        let rotated = sessions.refresh(&first).unwrap();
        assert_ne!(rotated.refresh, first);

        // The presented token was revoked by the rotation
        assert!(matches!(
            sessions.refresh(&first),
            Err(ApiError::InvalidToken(_))
        ));

        // The replacement still works
        assert!(sessions.refresh(&rotated.refresh).is_ok());
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let sessions = sessions();

        let session = sessions.register("kinds@test.com", "hunter2").unwrap();
        assert!(matches!(
            sessions.refresh(&session.tokens.access),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_logout_blacklists_refresh_token() {
        let sessions = sessions();

        let session = sessions.register("bye@test.com", "hunter2").unwrap();
        sessions.logout(Some(&session.tokens.refresh)).unwrap();

        // Signature and expiry are still fine; only the ledger says no
        assert!(matches!(
            sessions.refresh(&session.tokens.refresh),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_logout_tolerates_missing_or_garbage_token() {
        let sessions = sessions();

        assert!(sessions.logout(None).is_ok());
        assert!(sessions.logout(Some("garbage")).is_ok());
    }

    #[test]
    fn test_authenticate() {
        let sessions = sessions();

        let session = sessions.register("me@test.com", "hunter2").unwrap();
        let user = sessions.authenticate(&session.tokens.access).unwrap();
        assert_eq!(user.id, session.user.id);

        // Refresh tokens are not bearer credentials
        assert!(matches!(
            sessions.authenticate(&session.tokens.refresh),
            Err(ApiError::InvalidToken(_))
        ));

        // A deleted subject no longer authenticates
        sessions.users.mark_deleted(session.user.id).unwrap();
        assert!(matches!(
            sessions.authenticate(&session.tokens.access),
            Err(ApiError::InvalidToken(_))
        ));
    }
}
