//! Role and scoped-permission authorization.

pub mod guard;
pub mod resolver;

pub use guard::{AccessGuard, AccessRequirement, RoleGuard, ScopeGuard};
pub use resolver::PermissionResolver;
