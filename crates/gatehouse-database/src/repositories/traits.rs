//! Repository traits the gate depends on.
//!
//! The gate only reads accounts and permissions; the refresh token
//! repository is written exclusively by the session flows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatehouse_core::result::AppResult;
use gatehouse_core::types::{AccountId, AccountPermissionId, PermissionId};
use gatehouse_entity::account::Account;
use gatehouse_entity::permission::{AccountPermission, Permission, PermissionScope};
use gatehouse_entity::token::RefreshToken;

/// Read access to accounts, the permission catalog, grants, and scopes.
#[async_trait]
pub trait AccountRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find an account by its identifier.
    async fn find_account_by_id(&self, id: AccountId) -> AppResult<Option<Account>>;

    /// Find an account by its unique login.
    async fn find_account_by_login(&self, login: &str) -> AppResult<Option<Account>>;

    /// Find a catalog permission by name.
    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// Find the grants of `permission_id` to `account_id`.
    async fn find_account_permissions(
        &self,
        account_id: AccountId,
        permission_id: PermissionId,
    ) -> AppResult<Vec<AccountPermission>>;

    /// Find the unit scopes restricting a grant.
    async fn find_permission_scopes(
        &self,
        account_permission_id: AccountPermissionId,
    ) -> AppResult<Vec<PermissionScope>>;
}

/// Persistence for issued refresh tokens, keyed by token hash.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a token row by hash.
    async fn find(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;

    /// Insert a new token row.
    async fn insert(&self, token: &RefreshToken) -> AppResult<()>;

    /// Delete a token row by hash. Returns `true` only for the caller that
    /// actually removed the row, which makes rotation race-safe.
    async fn delete(&self, token_hash: &str) -> AppResult<bool>;

    /// Delete every token of an account. Returns the number removed.
    async fn delete_by_account(&self, account_id: AccountId) -> AppResult<u64>;

    /// Delete every token expired at `now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
