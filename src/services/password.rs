//! Password hashing and secret generation
//!
//! Passwords are hashed with Argon2id using the argon2 crate's default
//! parameters and a fresh random salt, stored as PHC strings. Session tokens
//! and generated passwords come from the OS random source.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};

/// Random bytes in a session token
pub const SESSION_TOKEN_BYTES: usize = 32;

const RANDOM_PASSWORD_BYTES: usize = 16;
const RANDOM_PASSWORD_LEN: usize = 20;

/// Hash a password using Argon2id with secure defaults.
///
/// Returns the PHC string (algorithm, parameters, salt and hash).
///
/// # Example
///
/// ```ignore
/// use spendlog::services::password::hash_password;
///
/// let hash = hash_password("my_secure_password")?;
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Any failure, including a hash that does not parse, counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate an opaque session token: 32 random bytes, URL-safe base64.
pub fn generate_session_token() -> Result<String> {
    let bytes = random_bytes::<SESSION_TOKEN_BYTES>()?;
    Ok(URL_SAFE.encode(bytes))
}

/// Generate a throwaway password for the bootstrap administrator.
pub fn generate_random_password() -> Result<String> {
    let bytes = random_bytes::<RANDOM_PASSWORD_BYTES>()?;
    let mut password = URL_SAFE.encode(bytes);
    password.truncate(RANDOM_PASSWORD_LEN);
    Ok(password)
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| anyhow::anyhow!("OS random source failed: {}", e))?;
    Ok(buf)
}
