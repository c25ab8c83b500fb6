//! Keygate account and authentication service
//!
//! A user-account backend: registration, password login, access/refresh
//! token issuance and rotation, revocation, and federated login via Google.

pub mod config;
pub mod error;
pub mod oauth;
pub mod reconcile;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

pub use config::{Config, ConfigError, Environment, GoogleConfig};
pub use error::ApiError;
pub use oauth::{GoogleOauth, OauthProvider, OauthState};
pub use reconcile::Reconciler;
pub use session::{AuthSession, Sessions, TokenPair};
pub use state::AppState;
pub use store::{
    AuthProvider, InMemoryRevocationLedger, InMemoryUserStore, RevocationLedger, SqliteStore, User,
    UserStore, UserView,
};
