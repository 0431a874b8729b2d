//! # gatehouse-database
//!
//! The persistence collaborators consumed by the gate: the
//! [`AccountRepository`] and [`RefreshTokenRepository`] contracts, their
//! PostgreSQL implementations, and process-local implementations for
//! development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{AccountRepository, RefreshTokenRepository};
