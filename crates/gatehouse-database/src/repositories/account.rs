//! PostgreSQL account and permission repository.

use async_trait::async_trait;
use sqlx::PgPool;

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::result::AppResult;
use gatehouse_core::types::{AccountId, AccountPermissionId, PermissionId};
use gatehouse_entity::account::Account;
use gatehouse_entity::permission::{AccountPermission, Permission, PermissionScope};

use super::traits::AccountRepository;

/// Reads accounts, the permission catalog, grants, and scopes.
#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_account_by_id(&self, id: AccountId) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find account", e))
    }

    async fn find_account_by_login(&self, login: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account by login", e)
            })
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find permission", e)
            })
    }

    async fn find_account_permissions(
        &self,
        account_id: AccountId,
        permission_id: PermissionId,
    ) -> AppResult<Vec<AccountPermission>> {
        sqlx::query_as::<_, AccountPermission>(
            "SELECT id, account_id, permission_id FROM account_permissions \
             WHERE account_id = $1 AND permission_id = $2 ORDER BY id ASC",
        )
        .bind(account_id)
        .bind(permission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find account permissions", e)
        })
    }

    async fn find_permission_scopes(
        &self,
        account_permission_id: AccountPermissionId,
    ) -> AppResult<Vec<PermissionScope>> {
        sqlx::query_as::<_, PermissionScope>(
            "SELECT id, account_permission_id, unit_id FROM permission_scopes \
             WHERE account_permission_id = $1 ORDER BY unit_id ASC",
        )
        .bind(account_permission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find permission scopes", e)
        })
    }
}
