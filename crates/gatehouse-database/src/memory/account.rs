//! In-memory account, permission, grant, and scope tables.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use gatehouse_core::error::AppError;
use gatehouse_core::result::AppResult;
use gatehouse_core::types::{
    AccountId, AccountPermissionId, PermissionId, PermissionScopeId, UnitId,
};
use gatehouse_entity::account::Account;
use gatehouse_entity::permission::{AccountPermission, Permission, PermissionScope};

use crate::repositories::AccountRepository;

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    permissions: HashMap<PermissionId, Permission>,
    grants: HashMap<AccountPermissionId, AccountPermission>,
    scopes: HashMap<PermissionScopeId, PermissionScope>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Account repository backed by process memory.
///
/// Deletes cascade the same way the relational schema does: removing an
/// account or a permission removes its grants, and removing a grant
/// removes its scopes.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    tables: RwLock<Tables>,
}

impl MemoryAccountRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account. Fails if the id or login is already taken.
    pub async fn insert_account(&self, account: Account) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.accounts.contains_key(&account.id)
            || tables.accounts.values().any(|a| a.login == account.login)
        {
            return Err(AppError::conflict(format!(
                "Account '{}' already exists",
                account.login
            )));
        }
        tables.accounts.insert(account.id, account);
        Ok(())
    }

    /// Replaces a stored account, e.g. to change its role.
    pub async fn update_account(&self, account: Account) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        match tables.accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account;
                Ok(())
            }
            None => Err(AppError::not_found(format!("Account {} not found", account.id))),
        }
    }

    /// Removes an account together with its grants and their scopes.
    pub async fn delete_account(&self, id: AccountId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.accounts.remove(&id).is_none() {
            return Ok(false);
        }
        let grant_ids: Vec<AccountPermissionId> = tables
            .grants
            .values()
            .filter(|g| g.account_id == id)
            .map(|g| g.id)
            .collect();
        remove_grants(&mut tables, &grant_ids);
        Ok(true)
    }

    /// Adds a permission to the catalog, or returns the existing entry.
    pub async fn insert_permission(&self, name: &str) -> AppResult<Permission> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.permissions.values().find(|p| p.name == name) {
            return Ok(existing.clone());
        }
        let permission = Permission {
            id: PermissionId(tables.next_id()),
            name: name.to_string(),
        };
        tables.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    /// Removes a catalog permission and every grant of it.
    pub async fn delete_permission(&self, id: PermissionId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.permissions.remove(&id).is_none() {
            return Ok(false);
        }
        let grant_ids: Vec<AccountPermissionId> = tables
            .grants
            .values()
            .filter(|g| g.permission_id == id)
            .map(|g| g.id)
            .collect();
        remove_grants(&mut tables, &grant_ids);
        Ok(true)
    }

    /// Grants a permission to an account. Both must exist.
    pub async fn grant(
        &self,
        account_id: AccountId,
        permission_id: PermissionId,
    ) -> AppResult<AccountPermission> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&account_id) {
            return Err(AppError::conflict(format!("Account {account_id} does not exist")));
        }
        if !tables.permissions.contains_key(&permission_id) {
            return Err(AppError::conflict(format!(
                "Permission {permission_id} does not exist"
            )));
        }
        if let Some(existing) = tables
            .grants
            .values()
            .find(|g| g.account_id == account_id && g.permission_id == permission_id)
        {
            return Ok(existing.clone());
        }
        let grant = AccountPermission {
            id: AccountPermissionId(tables.next_id()),
            account_id,
            permission_id,
        };
        tables.grants.insert(grant.id, grant.clone());
        Ok(grant)
    }

    /// Restricts a grant to a unit. The grant must exist.
    pub async fn add_scope(
        &self,
        account_permission_id: AccountPermissionId,
        unit_id: UnitId,
    ) -> AppResult<PermissionScope> {
        let mut tables = self.tables.write().await;
        if !tables.grants.contains_key(&account_permission_id) {
            return Err(AppError::conflict(format!(
                "Grant {account_permission_id} does not exist"
            )));
        }
        let scope = PermissionScope {
            id: PermissionScopeId(tables.next_id()),
            account_permission_id,
            unit_id,
        };
        tables.scopes.insert(scope.id, scope.clone());
        Ok(scope)
    }

    /// Removes a grant and its scopes.
    pub async fn revoke(&self, account_permission_id: AccountPermissionId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let existed = tables.grants.contains_key(&account_permission_id);
        remove_grants(&mut tables, &[account_permission_id]);
        Ok(existed)
    }
}

fn remove_grants(tables: &mut Tables, grant_ids: &[AccountPermissionId]) {
    for id in grant_ids {
        tables.grants.remove(id);
    }
    tables
        .scopes
        .retain(|_, scope| !grant_ids.contains(&scope.account_permission_id));
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_account_by_id(&self, id: AccountId) -> AppResult<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_login(&self, login: &str) -> AppResult<Option<Account>> {
        Ok(self
            .tables
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.login == login)
            .cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        Ok(self
            .tables
            .read()
            .await
            .permissions
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn find_account_permissions(
        &self,
        account_id: AccountId,
        permission_id: PermissionId,
    ) -> AppResult<Vec<AccountPermission>> {
        let tables = self.tables.read().await;
        let mut grants: Vec<AccountPermission> = tables
            .grants
            .values()
            .filter(|g| g.account_id == account_id && g.permission_id == permission_id)
            .cloned()
            .collect();
        grants.sort_by_key(|g| g.id);
        Ok(grants)
    }

    async fn find_permission_scopes(
        &self,
        account_permission_id: AccountPermissionId,
    ) -> AppResult<Vec<PermissionScope>> {
        let tables = self.tables.read().await;
        let mut scopes: Vec<PermissionScope> = tables
            .scopes
            .values()
            .filter(|s| s.account_permission_id == account_permission_id)
            .cloned()
            .collect();
        scopes.sort_by_key(|s| s.unit_id);
        Ok(scopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_entity::account::AccountRole;

    async fn seeded() -> (MemoryAccountRepository, Account, Permission) {
        let repo = MemoryAccountRepository::new();
        let account = Account::new("alice", AccountRole::User, "hash");
        repo.insert_account(account.clone()).await.unwrap();
        let permission = repo.insert_permission("manage-projects").await.unwrap();
        (repo, account, permission)
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_login() {
        let (repo, account, _) = seeded().await;
        let by_id = repo.find_account_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(by_id.login, "alice");
        let by_login = repo.find_account_by_login("alice").await.unwrap().unwrap();
        assert_eq!(by_login.id, account.id);
        assert!(repo.find_account_by_login("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let (repo, _, _) = seeded().await;
        let dup = Account::new("alice", AccountRole::Admin, "hash");
        assert!(repo.insert_account(dup).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_permission_is_idempotent() {
        let (repo, _, permission) = seeded().await;
        let again = repo.insert_permission("manage-projects").await.unwrap();
        assert_eq!(again.id, permission.id);
    }

    #[tokio::test]
    async fn test_scope_requires_existing_grant() {
        let (repo, _, _) = seeded().await;
        let result = repo.add_scope(AccountPermissionId(999), UnitId(5)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_grant_requires_existing_account() {
        let (repo, _, permission) = seeded().await;
        assert!(repo.grant(AccountId::new(), permission.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_account_cascades_to_grants_and_scopes() {
        let (repo, account, permission) = seeded().await;
        let grant = repo.grant(account.id, permission.id).await.unwrap();
        repo.add_scope(grant.id, UnitId(5)).await.unwrap();

        assert!(repo.delete_account(account.id).await.unwrap());
        assert!(
            repo.find_account_permissions(account.id, permission.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(repo.find_permission_scopes(grant.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_permission_cascades_to_grants() {
        let (repo, account, permission) = seeded().await;
        let grant = repo.grant(account.id, permission.id).await.unwrap();
        repo.add_scope(grant.id, UnitId(7)).await.unwrap();

        assert!(repo.delete_permission(permission.id).await.unwrap());
        assert!(
            repo.find_permission_by_name("manage-projects")
                .await
                .unwrap()
                .is_none()
        );
        assert!(repo.find_permission_scopes(grant.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scopes_sorted_by_unit() {
        let (repo, account, permission) = seeded().await;
        let grant = repo.grant(account.id, permission.id).await.unwrap();
        repo.add_scope(grant.id, UnitId(9)).await.unwrap();
        repo.add_scope(grant.id, UnitId(2)).await.unwrap();
        let units: Vec<UnitId> = repo
            .find_permission_scopes(grant.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.unit_id)
            .collect();
        assert_eq!(units, vec![UnitId(2), UnitId(9)]);
    }
}
