//! # gatehouse-api
//!
//! HTTP layer for Gatehouse built on Axum.
//!
//! Every gated route carries an access rule enforced by the gate
//! middleware before the handler runs; the handler receives the verified
//! claims as a request extension.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Components, assemble, run_server};
pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
