//! # gatehouse-core
//!
//! Core crate for Gatehouse. Contains configuration schemas, typed
//! identifiers, the rate-limit storage trait, and the unified error system
//! shared by every other crate.
//!
//! This crate has **no** internal dependencies on other Gatehouse crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, FieldError, GateError};
pub use result::{AppResult, GateResult};
