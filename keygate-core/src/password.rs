//! Password hashing

use crate::error::PasswordError;

/// bcrypt cost factor
pub const BCRYPT_COST: u32 = 12;

/// Hash a password with bcrypt
pub fn hash(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| PasswordError(e.to_string()))
}

/// Verify a password against a stored hash.
///
/// A malformed hash verifies as false rather than erroring.
pub fn verify(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
