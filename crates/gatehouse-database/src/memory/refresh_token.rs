//! In-memory refresh token table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use gatehouse_core::error::AppError;
use gatehouse_core::result::AppResult;
use gatehouse_core::types::AccountId;
use gatehouse_entity::token::RefreshToken;

use crate::repositories::RefreshTokenRepository;

/// Refresh token rows keyed by token hash.
///
/// `DashMap::remove` is atomic per key, so at most one concurrent caller
/// observes a successful delete of a given hash.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenRepository {
    tokens: DashMap<String, RefreshToken>,
}

impl MemoryRefreshTokenRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn find(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self.tokens.get(token_hash).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, token: &RefreshToken) -> AppResult<()> {
        match self.tokens.entry(token.token_hash.clone()) {
            Entry::Occupied(_) => {
                Err(AppError::conflict("Refresh token hash already stored"))
            }
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn delete(&self, token_hash: &str) -> AppResult<bool> {
        Ok(self.tokens.remove(token_hash).is_some())
    }

    async fn delete_by_account(&self, account_id: AccountId) -> AppResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| token.account_id != account_id);
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| !token.is_expired_at(now));
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }
}
