//! Refresh token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gatehouse_core::types::{AccountId, RefreshTokenId};

/// A persisted long-lived token.
///
/// Only the SHA-256 hash of the opaque value is stored; the value itself is
/// handed to the client once and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Row identifier.
    pub id: RefreshTokenId,
    /// Hex SHA-256 of the opaque token value.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Owner.
    pub account_id: AccountId,
    /// After this instant the token is no longer trusted.
    pub expires_at: DateTime<Utc>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_expired_at_boundary() {
        let now = Utc::now();
        let token = RefreshToken {
            id: RefreshTokenId::new(),
            token_hash: "h".to_string(),
            account_id: AccountId::new(),
            expires_at: now,
            created_at: now - Duration::hours(1),
        };
        assert!(token.is_expired_at(now));
        assert!(!token.is_expired_at(now - Duration::seconds(1)));
    }
}
