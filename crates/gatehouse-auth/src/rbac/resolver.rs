//! Resolves roles and unit-scoped permission grants.
//!
//! Resolution for `has_permission(account, permission, scope)`:
//! 1. Unknown permission name or no grant rows: denied.
//! 2. Any grant row without scope rows: global, allowed for every unit and
//!    for unscoped checks.
//! 3. Otherwise allowed only when `scope` names one of the granted units.
//!    A scoped grant never satisfies an unscoped check.

use std::sync::Arc;

use tracing::warn;

use gatehouse_core::result::AppResult;
use gatehouse_core::types::{AccountId, UnitId};
use gatehouse_database::AccountRepository;
use gatehouse_entity::account::{Account, AccountRole};

/// Answers role and permission questions against the account repository.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    accounts: Arc<dyn AccountRepository>,
}

impl PermissionResolver {
    /// Creates a resolver over the account repository.
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Loads the stored account.
    pub async fn find_account(&self, account_id: AccountId) -> AppResult<Option<Account>> {
        self.accounts.find_account_by_id(account_id).await
    }

    /// Whether the stored account currently holds `role`.
    ///
    /// A missing account holds no role.
    pub async fn has_role(&self, account_id: AccountId, role: AccountRole) -> AppResult<bool> {
        Ok(self
            .find_account(account_id)
            .await?
            .is_some_and(|account| account.role == role))
    }

    /// Whether the account holds `permission`, optionally within `scope`.
    pub async fn has_permission(
        &self,
        account_id: AccountId,
        permission: &str,
        scope: Option<UnitId>,
    ) -> AppResult<bool> {
        let Some(permission_row) = self.accounts.find_permission_by_name(permission).await? else {
            warn!(permission = %permission, "Permission check against unknown catalog entry");
            return Ok(false);
        };

        let grants = self
            .accounts
            .find_account_permissions(account_id, permission_row.id)
            .await?;

        for grant in &grants {
            let scopes = self.accounts.find_permission_scopes(grant.id).await?;
            if scopes.is_empty() {
                return Ok(true);
            }
            if let Some(unit) = scope {
                if scopes.iter().any(|s| s.unit_id == unit) {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_database::memory::MemoryAccountRepository;

    use super::*;

    struct Fixture {
        repo: Arc<MemoryAccountRepository>,
        resolver: PermissionResolver,
        account: Account,
    }

    async fn fixture(role: AccountRole) -> Fixture {
        let repo = Arc::new(MemoryAccountRepository::new());
        let account = Account::new("alice", role, "hash");
        repo.insert_account(account.clone()).await.unwrap();
        repo.insert_permission("manage-projects").await.unwrap();
        let resolver = PermissionResolver::new(repo.clone());
        Fixture {
            repo,
            resolver,
            account,
        }
    }

    async fn grant(fixture: &Fixture, units: &[i64]) {
        let permission = fixture
            .repo
            .insert_permission("manage-projects")
            .await
            .unwrap();
        let grant = fixture
            .repo
            .grant(fixture.account.id, permission.id)
            .await
            .unwrap();
        for unit in units {
            fixture.repo.add_scope(grant.id, UnitId(*unit)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_no_grant_is_denied() {
        let f = fixture(AccountRole::Admin).await;
        assert!(
            !f.resolver
                .has_permission(f.account.id, "manage-projects", None)
                .await
                .unwrap()
        );
        assert!(
            !f.resolver
                .has_permission(f.account.id, "manage-projects", Some(UnitId(1)))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_global_grant_allows_every_unit_and_none() {
        let f = fixture(AccountRole::Manager).await;
        grant(&f, &[]).await;
        for scope in [None, Some(UnitId(1)), Some(UnitId(5)), Some(UnitId(999))] {
            assert!(
                f.resolver
                    .has_permission(f.account.id, "manage-projects", scope)
                    .await
                    .unwrap(),
                "scope {scope:?} should be allowed"
            );
        }
    }

    #[tokio::test]
    async fn test_scoped_grant_allows_only_listed_units() {
        let f = fixture(AccountRole::Admin).await;
        grant(&f, &[5, 6]).await;

        for unit in [5, 6] {
            assert!(
                f.resolver
                    .has_permission(f.account.id, "manage-projects", Some(UnitId(unit)))
                    .await
                    .unwrap()
            );
        }
        assert!(
            !f.resolver
                .has_permission(f.account.id, "manage-projects", Some(UnitId(7)))
                .await
                .unwrap()
        );
        assert!(
            !f.resolver
                .has_permission(f.account.id, "manage-projects", None)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_permission_is_denied() {
        let f = fixture(AccountRole::Manager).await;
        grant(&f, &[]).await;
        assert!(
            !f.resolver
                .has_permission(f.account.id, "delete-everything", None)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_revoked_grant_is_denied() {
        let f = fixture(AccountRole::Manager).await;
        let permission = f.repo.insert_permission("manage-projects").await.unwrap();
        let g = f.repo.grant(f.account.id, permission.id).await.unwrap();
        f.repo.revoke(g.id).await.unwrap();
        assert!(
            !f.resolver
                .has_permission(f.account.id, "manage-projects", None)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_has_role() {
        let f = fixture(AccountRole::Manager).await;
        assert!(
            f.resolver
                .has_role(f.account.id, AccountRole::Manager)
                .await
                .unwrap()
        );
        assert!(
            !f.resolver
                .has_role(f.account.id, AccountRole::Admin)
                .await
                .unwrap()
        );
        assert!(
            !f.resolver
                .has_role(AccountId::new(), AccountRole::Manager)
                .await
                .unwrap()
        );
    }
}
