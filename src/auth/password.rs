//! Password hashing for user accounts
//!
//! Argon2id with default parameters; the stored string is the PHC encoding,
//! so salt and parameters travel with the hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::ConnectorError;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a plaintext password for storage on a user document.
pub fn hash_password(password: &str) -> Result<String, ConnectorError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConnectorError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a login attempt against a stored hash.
///
/// A malformed stored hash is a server-side fault, not a failed login.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ConnectorError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ConnectorError::Internal(format!("Stored password hash is corrupt: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
