//! Rate-limit bucket storage trait.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;
use crate::result::AppResult;

/// Fixed-window budget applied to every client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Points a client may consume per window.
    pub max_points: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Creates a policy.
    pub fn new(max_points: u32, window: Duration) -> Self {
        Self { max_points, window }
    }

    /// Builds the policy from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_points, config.window())
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(60))
    }
}

/// Result of consuming points from a client's bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitOutcome {
    /// Whether the request fits in the current window.
    pub allowed: bool,
    /// The window budget.
    pub limit: u32,
    /// Points left in the current window (0 once over budget).
    pub remaining: u32,
    /// Seconds until the window rolls over; 0 when allowed.
    pub retry_after_seconds: u64,
}

/// Storage for per-client rate buckets.
///
/// Implementations must serialize increments on the same key so that two
/// concurrent requests cannot both observe "under budget". Two
/// implementations are provided:
/// - In-memory (moka per-key compute), process-local
/// - Redis-based (Lua script), shared across instances
#[async_trait]
pub trait RateLimitStore: Send + Sync + std::fmt::Debug + 'static {
    /// Adds `cost` points to `key`'s bucket under `policy` and reports
    /// whether the bucket is still within budget.
    async fn consume(
        &self,
        key: &str,
        cost: u32,
        policy: &RateLimitPolicy,
    ) -> AppResult<RateLimitOutcome>;

    /// Drops buckets whose window has elapsed. Returns how many were removed.
    async fn sweep(&self, policy: &RateLimitPolicy) -> AppResult<usize>;

    /// Number of buckets currently tracked.
    async fn tracked_keys(&self) -> AppResult<usize>;
}
