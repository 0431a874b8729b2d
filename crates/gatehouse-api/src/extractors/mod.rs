//! Custom Axum extractors.

pub mod auth;
pub mod validated;

pub use auth::AuthClaims;
pub use validated::ValidatedJson;
