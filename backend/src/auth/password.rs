//! Password hashing using argon2
//!
//! Provides salted hashing and constant-time verification.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Request handlers use the `_async`
//! variants, which run the work on the blocking thread pool.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};

/// Memory cost in KiB
pub const HASH_MEMORY_KIB: u32 = 19_456;
/// Number of passes over memory
pub const HASH_ITERATIONS: u32 = 2;
/// Degree of parallelism
pub const HASH_PARALLELISM: u32 = 1;

/// Hash verified on the login miss path so unknown identities cost the same
/// as wrong passwords.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| PasswordService::hash("dummy-password-for-timing-0").ok());

/// Password hashing service
///
/// Uses Argon2id with a fixed work factor.
pub struct PasswordService;

impl PasswordService {
    fn hasher() -> Result<Argon2<'static>> {
        let params = Params::new(HASH_MEMORY_KIB, HASH_ITERATIONS, HASH_PARALLELISM, None)
            .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password using argon2 (blocking operation)
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(password: SecretString) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(password.expose_secret()))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a hash (blocking operation)
    ///
    /// Parameters are read from the stored hash, so hashes created with an
    /// older work factor still verify.
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
        Ok(Self::hasher()?
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(password: SecretString, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(password.expose_secret(), &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Spend the same verification work as a real login, then report a mismatch
    pub async fn verify_dummy_async(password: SecretString) -> Result<bool> {
        tokio::task::spawn_blocking(move || {
            let hash = DUMMY_HASH
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Dummy hash unavailable"))?;
            Self::verify(password.expose_secret(), hash).map(|_| false)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }
}
