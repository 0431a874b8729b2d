//! Per-client fixed-window rate limiting.
//!
//! The limiter is storage-agnostic:
//! - In-memory buckets (default), one budget per process
//! - Redis counters (feature `redis-limiter`), one budget shared by every
//!   instance pointing at the same Redis

pub mod limiter;
pub mod memory;
#[cfg(feature = "redis-limiter")]
pub mod redis;
pub mod sweeper;

pub use limiter::RateLimiter;
pub use memory::MemoryRateLimitStore;
pub use sweeper::RateLimitSweeper;
