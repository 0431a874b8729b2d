//! # gatehouse-auth
//!
//! The request-gating layer: everything that decides whether a request may
//! reach a handler.
//!
//! ## Modules
//!
//! - `jwt` — signing and verification of stateless access tokens
//! - `password` — Argon2id secret hashing
//! - `authenticator` — turns an `Authorization` header into verified claims
//! - `session` — login, refresh token rotation, logout
//! - `rbac` — role and scoped permission resolution, access guards
//! - `rate_limit` — per-client fixed-window point budgets
//! - `gate` — composes the above into one admit/deny decision

pub mod authenticator;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod rbac;
pub mod session;

pub use authenticator::Authenticator;
pub use gate::{AccessRule, Admission, GateRequest, RequestGate, UnitParam};
pub use jwt::{Claims, IssuedToken, TokenCodec, TokenError};
pub use password::PasswordHasher;
pub use rate_limit::{MemoryRateLimitStore, RateLimitSweeper, RateLimiter};
pub use rbac::{AccessGuard, AccessRequirement, PermissionResolver, RoleGuard, ScopeGuard};
pub use session::{RefreshTokenCleanup, RefreshTokenStore, SessionManager, TokenPair};
