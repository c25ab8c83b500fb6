//! SQLite-based storage implementation

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{AuthProvider, RevocationLedger, StoreResult, User, UserStore};
use crate::error::ApiError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed store implementing both UserStore and RevocationLedger
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ApiError> {
        Self::from_connection(
            Connection::open(path).map_err(|e| ApiError::Internal(e.to_string()))?,
        )
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, ApiError> {
        Self::from_connection(
            Connection::open_in_memory().map_err(|e| ApiError::Internal(e.to_string()))?,
        )
    }

    fn from_connection(conn: Connection) -> Result<Self, ApiError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ApiError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| ApiError::Internal(e.to_string()))?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- User accounts; deletion is a soft flag
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                password_hash TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                is_verified INTEGER NOT NULL DEFAULT 0,
                is_superadmin INTEGER NOT NULL DEFAULT 0,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                auth_provider TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            -- Email uniqueness holds across live accounts only
            CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_live
                ON users(email) WHERE is_deleted = 0;

            -- Refresh-token denylist; rows expire with their token
            CREATE TABLE IF NOT EXISTS revoked_tokens (
                token TEXT PRIMARY KEY,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_revoked_expires ON revoked_tokens(expires_at);
            "#,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let id: String = row.get(0)?;
        let id = Uuid::parse_str(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let provider: String = row.get(7)?;
        let created_at: String = row.get(8)?;
        let updated_at: Option<String> = row.get(9)?;

        Ok(User {
            id,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            is_active: row.get(3)?,
            is_verified: row.get(4)?,
            is_superadmin: row.get(5)?,
            is_deleted: row.get(6)?,
            auth_provider: AuthProvider::from_str(&provider).unwrap_or(AuthProvider::Local),
            created_at: parse_timestamp(&created_at),
            updated_at: updated_at.as_deref().map(parse_timestamp),
        })
    }

    fn query_user(&self, sql: &str, value: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(sql, params![value], Self::row_to_user)
            .optional()
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, is_active, is_verified, is_superadmin, \
                            is_deleted, auth_provider, created_at, updated_at";

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

impl UserStore for SqliteStore {
    fn insert(&self, mut user: User) -> StoreResult<User> {
        user.email = user.email.to_lowercase();
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO users (id, email, password_hash, is_active, is_verified, \
             is_superadmin, is_deleted, auth_provider, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.is_active,
                user.is_verified,
                user.is_superadmin,
                user.is_deleted,
                user.auth_provider.as_str(),
                user.created_at.to_rfc3339(),
                user.updated_at.map(|t| t.to_rfc3339()),
            ],
        );

        match result {
            Ok(_) => Ok(user),
            // The partial unique index turns a registration race into the
            // same conflict a pre-checked duplicate produces.
            Err(e) if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Err(ApiError::UserAlreadyExists)
            }
            Err(e) => Err(ApiError::Internal(e.to_string())),
        }
    }

    fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.query_user(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND is_deleted = 0"),
            &id.to_string(),
        )
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.query_user(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND is_deleted = 0"),
            &email.to_lowercase(),
        )
    }

    fn mark_deleted(&self, id: Uuid) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE users SET is_deleted = 1, updated_at = ?1 WHERE id = ?2 AND is_deleted = 0",
                params![Utc::now().to_rfc3339(), id.to_string()],
            )
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        if changed == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    fn ping(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

impl RevocationLedger for SqliteStore {
    fn blacklist(&self, token: &str, ttl: Duration) -> StoreResult<()> {
        let now = Utc::now();
        let conn = self.conn.lock().unwrap();

        // Prune rows whose tokens have expired on their own
        conn.execute(
            "DELETE FROM revoked_tokens WHERE expires_at <= ?1",
            params![now.to_rfc3339()],
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO revoked_tokens (token, expires_at) VALUES (?1, ?2)",
            params![token, (now + ttl).to_rfc3339()],
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(())
    }

    fn is_active(&self, token: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let expires_at: Option<String> = conn
            .query_row(
                "SELECT expires_at FROM revoked_tokens WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let blacklisted = expires_at.is_some_and(|at| parse_timestamp(&at) > Utc::now());
        Ok(!blacklisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(
            email.to_string(),
            Some("hashed_password".to_string()),
            AuthProvider::Local,
            false,
        )
    }

    #[test]
    fn test_insert_and_lookup_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();

        let created = store.insert(user("sqlite@example.com")).unwrap();
        let found = store.find_by_email("SQLITE@example.com").unwrap().unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "sqlite@example.com");
        assert_eq!(found.auth_provider, AuthProvider::Local);
        assert!(found.password_hash.is_some());
    }

    #[test]
    fn test_duplicate_email_hits_unique_index() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.insert(user("dup@example.com")).unwrap();
        assert!(matches!(
            store.insert(user("dup@example.com")),
            Err(ApiError::UserAlreadyExists)
        ));
    }

    #[test]
    fn test_soft_delete_frees_email() {
        let store = SqliteStore::open_in_memory().unwrap();

        let created = store.insert(user("gone@example.com")).unwrap();
        store.mark_deleted(created.id).unwrap();

        assert!(store.find_by_id(created.id).unwrap().is_none());
        assert!(store.insert(user("gone@example.com")).is_ok());
    }

    #[test]
    fn test_revocations() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert!(store.is_active("token-a").unwrap());
        store.blacklist("token-a", Duration::days(7)).unwrap();
        assert!(!store.is_active("token-a").unwrap());

        store.blacklist("stale", Duration::seconds(-1)).unwrap();
        assert!(store.is_active("stale").unwrap());
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keygate.db");
        let path = path.to_str().unwrap();

        let created = {
            let store = SqliteStore::open(path).unwrap();
            store.blacklist("persisted-token", Duration::days(7)).unwrap();
            store.insert(user("persist@example.com")).unwrap()
        };

        let store = SqliteStore::open(path).unwrap();
        let found = store.find_by_email("persist@example.com").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(!store.is_active("persisted-token").unwrap());
    }
}
