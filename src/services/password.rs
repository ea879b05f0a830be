//! Password hashing module
//!
//! Passwords are hashed with Argon2id using the crate defaults and a random
//! salt per hash. Stored hashes are PHC strings.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Hash a password using Argon2id.
///
/// # Example
///
/// ```
/// use motoapi::services::password::{hash_password, verify_password};
///
/// let hash = hash_password("sekret123").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("sekret123", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Returns `Ok(false)` on mismatch and an error only for malformed hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

/// Check the password policy, returning the message to show on failure
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Ensure this field has at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}
