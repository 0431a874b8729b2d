//! Request gate configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadlines applied inside the request gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Upper bound for the rate-limit and authorization lookups, in milliseconds.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_ms: u64,
}

impl GateConfig {
    /// Returns the lookup deadline as a `Duration`.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: default_lookup_timeout(),
        }
    }
}

fn default_lookup_timeout() -> u64 {
    5_000
}
