//! Rate limiter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where rate buckets are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Process-local buckets. Each instance enforces its own budget.
    Memory,
    /// Buckets shared through Redis across instances.
    Redis,
}

/// Fixed-window rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Points a client may consume per window.
    #[serde(default = "default_max_points")]
    pub max_points: u32,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Upper bound on distinct client keys tracked in memory.
    #[serde(default = "default_max_tracked_keys")]
    pub max_tracked_keys: usize,
    /// How often idle buckets are swept, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Bucket storage backend.
    #[serde(default = "default_backend")]
    pub backend: RateLimitBackend,
    /// Redis URL (required for the `redis` backend).
    #[serde(default)]
    pub redis_url: String,
}

impl RateLimitConfig {
    /// Returns the window length as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            window_seconds: default_window(),
            max_tracked_keys: default_max_tracked_keys(),
            sweep_interval_seconds: default_sweep_interval(),
            backend: default_backend(),
            redis_url: String::new(),
        }
    }
}

fn default_max_points() -> u32 {
    100
}

fn default_window() -> u64 {
    60
}

fn default_max_tracked_keys() -> usize {
    100_000
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_backend() -> RateLimitBackend {
    RateLimitBackend::Memory
}
