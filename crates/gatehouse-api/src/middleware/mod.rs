//! Axum middleware.

pub mod gate;
pub mod logging;
