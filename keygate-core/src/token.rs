//! Token issuance and verification
//!
//! Access and refresh tokens are signed with distinct secrets, so a stolen
//! token of one kind can never be presented as the other even if one secret
//! leaks.

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::claims::{Claims, TokenKind};
use crate::error::TokenError;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Keys {
    fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Issues and verifies the two token kinds.
///
/// The access and refresh lifetimes are independent configuration values;
/// neither is derived from the other.
pub struct TokenEngine {
    access: Keys,
    refresh: Keys,
}

impl TokenEngine {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access: Keys::new(access_secret, access_ttl),
            refresh: Keys::new(refresh_secret, refresh_ttl),
        }
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Issue a signed token of the given kind for a subject.
    pub fn issue(&self, subject: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let claims = Claims::new(subject, kind, keys.ttl);
        jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token against the secret for `expected_kind`.
    ///
    /// Expiry and signature failures stay distinct so callers can log and
    /// test them separately, even when both map to the same HTTP status.
    pub fn verify(&self, token: &str, expected_kind: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data =
            jsonwebtoken::decode::<Claims>(token, &self.keys(expected_kind).decoding, &validation)
                .map_err(|e| match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                })?;

        // The kind claim must agree with the secret that verified it.
        if data.claims.kind != expected_kind {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}
