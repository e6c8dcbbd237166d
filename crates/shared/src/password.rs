//! Password hashing using Argon2id.
//!
//! Invited users and administrator-initiated resets receive a generated
//! password; only its Argon2id hash is persisted.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

use crate::crypto::generate_password;

/// Error type for password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// Argon2id parameters following OWASP recommendations (2024).
const MEMORY_COST: u32 = 19456; // 19 MiB in KiB
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password and returns the PHC-formatted string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = create_argon2()?;

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// A freshly generated password together with its hash.
#[derive(Debug, Clone)]
pub struct GeneratedPassword {
    /// Shown once to the administrator.
    pub plain: String,
    pub hash: String,
}

/// Generates a random password and hashes it.
pub fn generate_hashed_password() -> Result<GeneratedPassword, PasswordError> {
    let plain = generate_password();
    let hash = hash_password(&plain)?;
    Ok(GeneratedPassword { plain, hash })
}
