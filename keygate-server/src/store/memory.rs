//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{RevocationLedger, StoreResult, User, UserStore};
use crate::error::ApiError;

/// In-memory user store
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, mut user: User) -> StoreResult<User> {
        user.email = user.email.to_lowercase();
        // Uniqueness is decided under the same write lock that inserts, so
        // concurrent registrations for one email cannot both win.
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| !u.is_deleted && u.email == user.email) {
            return Err(ApiError::UserAlreadyExists);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .get(&id)
            .filter(|u| !u.is_deleted)
            .cloned())
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.to_lowercase();
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| !u.is_deleted && u.email == normalized)
            .cloned())
    }

    fn mark_deleted(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(&id) {
            user.is_deleted = true;
            user.updated_at = Some(Utc::now());
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }

    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// In-memory revocation ledger; expired entries are purged lazily
pub struct InMemoryRevocationLedger {
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationLedger {
    pub fn new() -> Self {
        Self {
            revoked: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRevocationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RevocationLedger for InMemoryRevocationLedger {
    fn blacklist(&self, token: &str, ttl: Duration) -> StoreResult<()> {
        let now = Utc::now();
        let mut revoked = self.revoked.write().unwrap();
        revoked.retain(|_, expires| *expires > now);
        revoked.insert(token.to_string(), now + ttl);
        Ok(())
    }

    fn is_active(&self, token: &str) -> StoreResult<bool> {
        let revoked = self.revoked.read().unwrap();
        let blacklisted = revoked
            .get(token)
            .is_some_and(|expires| *expires > Utc::now());
        Ok(!blacklisted)
    }
}
