//! Admission guards composing authentication output with the resolver.

use std::sync::Arc;

use tracing::debug;

use gatehouse_core::GateError;
use gatehouse_core::types::{AccountId, UnitId};
use gatehouse_entity::account::AccountRole;

use crate::jwt::Claims;

use super::resolver::PermissionResolver;

/// What an authenticated route demands beyond a valid token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirement {
    /// Exact role the stored account must hold.
    pub role: Option<AccountRole>,
    /// Catalog permission the account must hold, scoped to the request's
    /// unit when one is present.
    pub permission: Option<String>,
}

impl AccessRequirement {
    /// Any valid token is enough.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Requires an exact role.
    pub fn role(role: AccountRole) -> Self {
        Self {
            role: Some(role),
            permission: None,
        }
    }

    /// Requires a catalog permission.
    pub fn permission(name: impl Into<String>) -> Self {
        Self {
            role: None,
            permission: Some(name.into()),
        }
    }

    /// Adds a permission to an existing requirement.
    pub fn with_permission(mut self, name: impl Into<String>) -> Self {
        self.permission = Some(name.into());
        self
    }

    /// Whether nothing beyond authentication is required.
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.permission.is_none()
    }
}

/// Checks an account's stored role through the resolver.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    resolver: Arc<PermissionResolver>,
}

impl RoleGuard {
    /// Creates a guard over the resolver.
    pub fn new(resolver: Arc<PermissionResolver>) -> Self {
        Self { resolver }
    }

    /// Admits the account if it currently holds `required`.
    ///
    /// A denial re-reads the account once to report a deleted account as
    /// [`GateError::AccountNotFound`] rather than `Forbidden`.
    pub async fn check(&self, account_id: AccountId, required: AccountRole) -> Result<(), GateError> {
        if self.resolver.has_role(account_id, required).await? {
            return Ok(());
        }

        let Some(account) = self.resolver.find_account(account_id).await? else {
            return Err(GateError::AccountNotFound);
        };
        debug!(account_id = %account_id, role = %account.role, required = %required, "Role check failed");
        Err(GateError::forbidden(format!("Role '{required}' is required")))
    }
}

/// Checks a unit-scoped permission.
///
/// Handlers whose unit comes from the request body call this directly once
/// the body is parsed.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    resolver: Arc<PermissionResolver>,
}

impl ScopeGuard {
    /// Creates a guard over the resolver.
    pub fn new(resolver: Arc<PermissionResolver>) -> Self {
        Self { resolver }
    }

    /// Admits the account if it holds `permission` for `unit`.
    pub async fn check(
        &self,
        account_id: AccountId,
        permission: &str,
        unit: Option<UnitId>,
    ) -> Result<(), GateError> {
        if self
            .resolver
            .has_permission(account_id, permission, unit)
            .await?
        {
            return Ok(());
        }

        debug!(account_id = %account_id, permission = %permission, unit = ?unit, "Permission check failed");
        let reason = match unit {
            Some(unit) => format!("Permission '{permission}' is required for unit {unit}"),
            None => format!("Permission '{permission}' is required"),
        };
        Err(GateError::forbidden(reason))
    }
}

/// Admission decision for an authenticated request.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    resolver: Arc<PermissionResolver>,
    role_guard: RoleGuard,
    scope_guard: ScopeGuard,
}

impl AccessGuard {
    /// Creates a guard over the resolver.
    pub fn new(resolver: Arc<PermissionResolver>) -> Self {
        Self {
            role_guard: RoleGuard::new(Arc::clone(&resolver)),
            scope_guard: ScopeGuard::new(Arc::clone(&resolver)),
            resolver,
        }
    }

    /// The scope guard, for body-derived unit checks in handlers.
    pub fn scope_guard(&self) -> &ScopeGuard {
        &self.scope_guard
    }

    /// Checks `requirement` for the token subject.
    ///
    /// Whenever something is required, the subject is re-read so that a
    /// deleted account is [`GateError::AccountNotFound`] and a changed role
    /// applies immediately.
    pub async fn authorize(
        &self,
        claims: &Claims,
        requirement: &AccessRequirement,
        unit: Option<UnitId>,
    ) -> Result<(), GateError> {
        if requirement.is_empty() {
            return Ok(());
        }

        match requirement.role {
            Some(role) => self.role_guard.check(claims.sub, role).await?,
            None => {
                if self.resolver.find_account(claims.sub).await?.is_none() {
                    return Err(GateError::AccountNotFound);
                }
            }
        }

        if let Some(permission) = &requirement.permission {
            self.scope_guard.check(claims.sub, permission, unit).await?;
        }

        Ok(())
    }
}
