//! Permission catalog, grants, and unit scopes.

pub mod model;

pub use model::{AccountPermission, Permission, PermissionScope};
