//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_auth::TokenPair;
use gatehouse_core::types::{AccountId, UnitId};
use gatehouse_entity::account::{Account, AccountRole};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token.
    pub access_token: String,
    /// Opaque refresh token.
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token expiration.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration.
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: pair.token_type.to_string(),
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// Account summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    /// Account id.
    pub id: AccountId,
    /// Login.
    pub login: String,
    /// Current role.
    pub role: AccountRole,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            login: account.login.clone(),
            role: account.role,
            created_at: account.created_at,
        }
    }
}

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Issued tokens.
    #[serde(flatten)]
    pub tokens: TokenResponse,
    /// The authenticated account.
    pub account: AccountResponse,
}

/// Current identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// The stored account.
    pub account: AccountResponse,
    /// Role carried by the presented token.
    pub token_role: AccountRole,
    /// When the presented token expires.
    pub token_expires_at: DateTime<Utc>,
}

/// Manager overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewResponse {
    /// Requesting manager.
    pub account_id: AccountId,
    /// Server time of the snapshot.
    pub generated_at: DateTime<Utc>,
}

/// Projects of a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitProjectsResponse {
    /// The unit.
    pub unit_id: UnitId,
    /// Requesting account.
    pub account_id: AccountId,
    /// Project names.
    pub projects: Vec<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}
