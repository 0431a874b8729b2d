//! # gatehouse-entity
//!
//! Entity models read by the gate. Every struct in this crate represents a
//! database table row; all derive `Debug`, `Clone`, `Serialize`,
//! `Deserialize`, and `sqlx::FromRow`.

pub mod account;
pub mod permission;
pub mod token;
