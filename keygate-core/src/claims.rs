//! Token claims

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which signing secret and lifetime applies to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential sent on every request
    Access,
    /// Long-lived credential used only to mint new pairs
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Signed token payload.
///
/// `jti` makes every issued token unique: two tokens minted for the same
/// subject within the same second must still differ, otherwise revoking a
/// presented token on rotation could revoke its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: Uuid, kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Time left until expiry; zero once expired.
    pub fn remaining(&self) -> Duration {
        Duration::seconds((self.exp - Utc::now().timestamp()).max(0))
    }

    pub fn expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TokenKind::Access).unwrap(),
            "\"access\""
        );
        assert_eq!(
            serde_json::to_string(&TokenKind::Refresh).unwrap(),
            "\"refresh\""
        );
    }

    #[test]
    fn test_claims_unique_per_issue() {
        let subject = Uuid::new_v4();
        let a = Claims::new(subject, TokenKind::Refresh, Duration::days(7));
        let b = Claims::new(subject, TokenKind::Refresh, Duration::days(7));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let mut claims = Claims::new(Uuid::new_v4(), TokenKind::Access, Duration::minutes(30));
        claims.exp = Utc::now().timestamp() - 100;
        assert!(claims.expired());
        assert_eq!(claims.remaining(), Duration::zero());
    }
}
