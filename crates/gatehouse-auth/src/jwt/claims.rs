//! Claims embedded in every access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::types::AccountId;
use gatehouse_entity::account::AccountRole;

/// Verified identity attached to a request.
///
/// The role is a snapshot taken at issuance. Authorization re-reads the
/// stored account, so a role change takes effect before the token expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: AccountId,
    /// Account role at issuance.
    pub role: AccountRole,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Returns the account id from the subject claim.
    pub fn account_id(&self) -> AccountId {
        self.sub
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether the token is expired at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}
