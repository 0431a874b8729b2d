//! Core trait definitions implemented by other crates.

pub mod rate_limit;

pub use rate_limit::{RateLimitOutcome, RateLimitPolicy, RateLimitStore};
