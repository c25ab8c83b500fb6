//! Application state wiring

use std::sync::Arc;

use keygate_core::TokenEngine;

use crate::config::Config;
use crate::error::ApiError;
use crate::oauth::OauthProvider;
use crate::reconcile::Reconciler;
use crate::session::Sessions;
use crate::store::{AuthProvider, RevocationLedger, UserStore};

/// Shared state handed to every route handler.
///
/// Every collaborator is constructed once at startup and injected here;
/// nothing in the process is a global.
pub struct AppState<U, L, P> {
    pub config: Config,
    pub sessions: Sessions<U, L>,
    pub reconciler: Reconciler<U>,
    pub users: Arc<U>,
    oauth: Option<P>,
}

impl<U, L, P> AppState<U, L, P>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    pub fn new(
        config: Config,
        tokens: TokenEngine,
        users: U,
        revoked: L,
        oauth: Option<P>,
    ) -> Self {
        let tokens = Arc::new(tokens);
        let users = Arc::new(users);
        let revoked = Arc::new(revoked);

        Self {
            sessions: Sessions::new(tokens, users.clone(), revoked),
            reconciler: Reconciler::new(users.clone(), AuthProvider::Google),
            users,
            oauth,
            config,
        }
    }

    /// The OAuth provider, or the configuration failure federated routes
    /// surface when Google is not set up.
    pub fn oauth(&self) -> Result<&P, ApiError> {
        self.oauth
            .as_ref()
            .ok_or_else(|| ApiError::OauthConfig("Google OAuth is not configured".to_string()))
    }
}
