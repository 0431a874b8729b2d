//! Convenience result type aliases for Gatehouse.

use crate::error::{AppError, GateError};

/// Result of an infrastructure operation (repository, store, config).
pub type AppResult<T> = Result<T, AppError>;

/// Result of a gating decision or session flow.
pub type GateResult<T> = Result<T, GateError>;
