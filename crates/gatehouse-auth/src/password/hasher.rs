//! Argon2id secret hashing and verification.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use gatehouse_core::error::AppError;

/// Hashes and verifies account secrets as Argon2id PHC strings.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

static PLACEHOLDER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| PasswordHasher.hash_secret("gatehouse-placeholder").ok());

impl PasswordHasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext secret with a random salt.
    pub fn hash_secret(&self, secret: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Secret hashing failed: {e}")))
    }

    /// Runs one verification against a throwaway hash and discards the
    /// outcome.
    ///
    /// Called when no account matches a login so that unknown logins cost
    /// the same Argon2 work as known ones.
    pub fn verify_placeholder(&self, secret: &str) {
        if let Some(hash) = PLACEHOLDER_HASH.as_deref() {
            let _ = self.verify_secret(secret, hash);
        }
    }

    /// Checks a plaintext secret against a stored PHC hash.
    ///
    /// A mismatch is `Ok(false)`; only an unreadable hash is an error.
    pub fn verify_secret(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid secret hash format: {e}")))?;

        match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Secret verification failed: {e}"))),
        }
    }
}
