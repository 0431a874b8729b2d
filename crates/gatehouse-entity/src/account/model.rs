//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gatehouse_core::types::AccountId;

use super::role::AccountRole;

/// An account as owned by the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier; the token subject.
    pub id: AccountId,
    /// Unique login name.
    pub login: String,
    /// Account role.
    pub role: AccountRole,
    /// Argon2id PHC hash of the account secret.
    #[serde(skip_serializing)]
    pub hashed_secret: String,
    /// Whether the account completed verification.
    pub verified: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Builds a new account with a fresh identifier.
    pub fn new(login: impl Into<String>, role: AccountRole, hashed_secret: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(),
            login: login.into(),
            role,
            hashed_secret: hashed_secret.into(),
            verified: true,
            created_at: Utc::now(),
        }
    }

    /// Returns a copy marked as not yet verified.
    pub fn unverified(mut self) -> Self {
        self.verified = false;
        self
    }
}
