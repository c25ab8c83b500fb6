//! Storage abstractions for the server

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemoryRevocationLedger, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

/// Trait for user account storage.
///
/// Lookups never return soft-deleted accounts, and email uniqueness is
/// enforced against non-deleted rows only.
pub trait UserStore: Send + Sync {
    /// Insert a new user; a taken email fails with `UserAlreadyExists`,
    /// including when two inserts race.
    fn insert(&self, user: User) -> StoreResult<User>;

    /// Get a user by ID
    fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Get a user by email address (case-insensitive)
    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Soft-delete: the row stays, lookups stop returning it
    fn mark_deleted(&self, id: Uuid) -> StoreResult<()>;

    /// Liveness probe for the readiness endpoint
    fn ping(&self) -> StoreResult<()>;
}

/// Trait for the refresh-token denylist.
pub trait RevocationLedger: Send + Sync {
    /// Record a token as revoked; the entry expires after `ttl`.
    /// Blacklisting the same token twice is harmless.
    fn blacklist(&self, token: &str, ttl: Duration) -> StoreResult<()>;

    /// False while an unexpired blacklist entry exists
    fn is_active(&self, token: &str) -> StoreResult<bool>;
}

/// Allow one shared backing store to serve as both traits
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    fn insert(&self, user: User) -> StoreResult<User> {
        (**self).insert(user)
    }

    fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).find_by_email(email)
    }

    fn mark_deleted(&self, id: Uuid) -> StoreResult<()> {
        (**self).mark_deleted(id)
    }

    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }
}

impl<T: RevocationLedger + ?Sized> RevocationLedger for Arc<T> {
    fn blacklist(&self, token: &str, ttl: Duration) -> StoreResult<()> {
        (**self).blacklist(token, ttl)
    }

    fn is_active(&self, token: &str) -> StoreResult<bool> {
        (**self).is_active(token)
    }
}
