//! Persistence of opaque refresh tokens.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use gatehouse_core::GateError;
use gatehouse_core::result::AppResult;
use gatehouse_core::types::{AccountId, RefreshTokenId};
use gatehouse_database::RefreshTokenRepository;
use gatehouse_entity::token::RefreshToken;

/// Hex SHA-256 of an opaque token value, the form persisted.
pub fn hash_token(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

fn generate_value() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// Issues, rotates, and revokes refresh tokens.
#[derive(Debug, Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepository>,
    ttl: Duration,
}

impl RefreshTokenStore {
    /// Creates a store issuing tokens valid for `ttl`.
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, ttl: Duration) -> Self {
        Self { repo, ttl }
    }

    /// Issues a new token for `account_id`.
    ///
    /// Returns the opaque value for the client and the persisted row.
    pub async fn issue(&self, account_id: AccountId) -> AppResult<(String, RefreshToken)> {
        let value = generate_value();
        let now = Utc::now();
        let row = RefreshToken {
            id: RefreshTokenId::new(),
            token_hash: hash_token(&value),
            account_id,
            expires_at: now + self.ttl,
            created_at: now,
        };
        self.repo.insert(&row).await?;
        Ok((value, row))
    }

    /// Consumes a token for rotation.
    ///
    /// Absent, expired, or concurrently consumed tokens are
    /// [`GateError::RefreshTokenInvalid`]. Expired rows are deleted on sight.
    pub async fn consume(&self, value: &str) -> Result<RefreshToken, GateError> {
        let hash = hash_token(value);
        let row = self
            .repo
            .find(&hash)
            .await?
            .ok_or(GateError::RefreshTokenInvalid)?;

        if row.is_expired_at(Utc::now()) {
            self.repo.delete(&hash).await?;
            debug!(account_id = %row.account_id, "Expired refresh token presented");
            return Err(GateError::RefreshTokenInvalid);
        }

        if !self.repo.delete(&hash).await? {
            debug!(account_id = %row.account_id, "Refresh token already rotated");
            return Err(GateError::RefreshTokenInvalid);
        }

        Ok(row)
    }

    /// Deletes one token. Returns whether it existed.
    pub async fn revoke(&self, value: &str) -> AppResult<bool> {
        self.repo.delete(&hash_token(value)).await
    }

    /// Deletes every token of an account.
    pub async fn revoke_all(&self, account_id: AccountId) -> AppResult<u64> {
        self.repo.delete_by_account(account_id).await
    }

    /// Deletes every expired row.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.repo.delete_expired(Utc::now()).await
    }
}
