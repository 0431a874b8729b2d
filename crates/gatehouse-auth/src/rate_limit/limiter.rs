//! Rate limiter service injected into the request gate.

use std::sync::Arc;

use tracing::debug;

use gatehouse_core::result::AppResult;
use gatehouse_core::traits::{RateLimitOutcome, RateLimitPolicy, RateLimitStore};

/// Charges requests against a fixed-window point budget per client key.
///
/// Windows are fixed, not sliding: a client can spend its full budget at
/// the end of one window and again at the start of the next, so up to
/// `2 * max_points` requests may pass across a boundary.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    /// Creates a limiter over `store` enforcing `policy`.
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    /// The enforced policy.
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// The underlying bucket store.
    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }

    /// Charges `cost` points to `client_key`.
    ///
    /// Denied requests still consume points; nothing is rolled back.
    pub async fn consume(&self, client_key: &str, cost: u32) -> AppResult<RateLimitOutcome> {
        let outcome = self.store.consume(client_key, cost, &self.policy).await?;
        if !outcome.allowed {
            debug!(
                client_key = %client_key,
                retry_after_seconds = outcome.retry_after_seconds,
                "Rate limit exceeded"
            );
        }
        Ok(outcome)
    }

    /// Drops buckets whose window has elapsed.
    pub async fn sweep(&self) -> AppResult<usize> {
        self.store.sweep(&self.policy).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::rate_limit::MemoryRateLimitStore;

    fn limiter(max_points: u32) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryRateLimitStore::new(1_000, Duration::from_secs(60))),
            RateLimitPolicy::new(max_points, Duration::from_secs(60)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_then_deny_then_reset() {
        let limiter = limiter(100);

        for i in 0..100 {
            let outcome = limiter.consume("10.0.0.1", 1).await.unwrap();
            assert!(outcome.allowed, "request {i} should pass");
            assert_eq!(outcome.remaining, 99 - i);
        }

        let denied = limiter.consume("10.0.0.1", 1).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.retry_after_seconds > 0);
        assert!(denied.retry_after_seconds <= 60);

        tokio::time::advance(Duration::from_secs(60)).await;

        let reset = limiter.consume("10.0.0.1", 1).await.unwrap();
        assert!(reset.allowed);
        assert_eq!(reset.remaining, 99);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_have_independent_budgets() {
        let limiter = limiter(1);
        assert!(limiter.consume("a", 1).await.unwrap().allowed);
        assert!(!limiter.consume("a", 1).await.unwrap().allowed);
        assert!(limiter.consume("b", 1).await.unwrap().allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cost_larger_than_budget_is_denied() {
        let limiter = limiter(5);
        let outcome = limiter.consume("heavy", 6).await.unwrap();
        assert!(!outcome.allowed);
        assert_eq!(outcome.remaining, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_never_exceed_budget() {
        let limiter = Arc::new(limiter(100));
        let handles: Vec<_> = (0..150)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.consume("burst", 1).await.unwrap().allowed })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 100);
    }
}
