//! Permission entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gatehouse_core::types::{AccountId, AccountPermissionId, PermissionId, PermissionScopeId, UnitId};

/// A named capability from the static catalog (e.g. `manage-projects`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Catalog identifier.
    pub id: PermissionId,
    /// Unique capability name.
    pub name: String,
}

/// Grants a permission to an account.
///
/// Without [`PermissionScope`] children the grant is global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccountPermission {
    /// Grant identifier.
    pub id: AccountPermissionId,
    /// Grantee.
    pub account_id: AccountId,
    /// Granted permission.
    pub permission_id: PermissionId,
}

/// Restricts a grant to a single organizational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PermissionScope {
    /// Scope row identifier.
    pub id: PermissionScopeId,
    /// The restricted grant.
    pub account_permission_id: AccountPermissionId,
    /// The unit the grant is valid for.
    pub unit_id: UnitId,
}
