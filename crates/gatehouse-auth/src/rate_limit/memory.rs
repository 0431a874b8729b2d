//! In-memory rate buckets for single-instance deployments.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use moka::policy::EvictionPolicy;
use tokio::time::Instant;
use tracing::debug;

use gatehouse_core::config::RateLimitConfig;
use gatehouse_core::error::AppError;
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::{RateLimitOutcome, RateLimitPolicy, RateLimitStore};

/// Points consumed by one client in its current window.
#[derive(Debug, Clone, Copy)]
struct RateBucket {
    points_consumed: u64,
    window_started_at: Instant,
}

impl RateBucket {
    fn new(now: Instant) -> Self {
        Self {
            points_consumed: 0,
            window_started_at: now,
        }
    }

    fn window_elapsed(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_started_at) >= window
    }
}

/// Process-local bucket store backed by a bounded moka cache.
///
/// Increments on one key are serialized by the cache's per-key compute lock,
/// so concurrent requests cannot both observe "under budget". A bucket left
/// idle for `idle_after` has necessarily finished its window and expires on
/// its own. Past `max_tracked_keys` the least recently charged buckets are
/// evicted in the cache's batched maintenance, off the request path.
#[derive(Debug, Clone)]
pub struct MemoryRateLimitStore {
    buckets: Cache<String, RateBucket>,
}

impl MemoryRateLimitStore {
    /// Creates a store tracking at most `max_tracked_keys` clients.
    ///
    /// `idle_after` should be at least the policy window.
    pub fn new(max_tracked_keys: usize, idle_after: Duration) -> Self {
        let buckets = Cache::builder()
            .max_capacity(max_tracked_keys.max(1) as u64)
            .time_to_idle(idle_after)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { buckets }
    }

    /// Creates a store sized by the `rate_limit` configuration section.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_tracked_keys, config.window())
    }
}

fn retry_after_seconds(remaining: Duration) -> u64 {
    let whole = remaining.as_secs();
    let rounded = if remaining.subsec_nanos() > 0 {
        whole + 1
    } else {
        whole
    };
    rounded.max(1)
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn consume(
        &self,
        key: &str,
        cost: u32,
        policy: &RateLimitPolicy,
    ) -> AppResult<RateLimitOutcome> {
        let now = Instant::now();
        let window = policy.window;

        let result = self
            .buckets
            .entry_by_ref(key)
            .and_compute_with(|existing| async move {
                let mut bucket = existing
                    .map(|entry| entry.into_value())
                    .filter(|bucket| !bucket.window_elapsed(now, window))
                    .unwrap_or_else(|| RateBucket::new(now));
                bucket.points_consumed = bucket.points_consumed.saturating_add(u64::from(cost));
                Op::Put(bucket)
            })
            .await;

        let bucket = match result {
            CompResult::Inserted(entry)
            | CompResult::ReplacedWith(entry)
            | CompResult::Unchanged(entry) => entry.into_value(),
            CompResult::Removed(_) | CompResult::StillNone(_) => {
                return Err(AppError::internal(format!(
                    "Rate bucket for '{key}' was not stored"
                )));
            }
        };

        let limit = u64::from(policy.max_points);
        let allowed = bucket.points_consumed <= limit;
        let remaining = limit.saturating_sub(bucket.points_consumed) as u32;
        let retry_after_seconds = if allowed {
            0
        } else {
            let elapsed = now.duration_since(bucket.window_started_at);
            retry_after_seconds(window.saturating_sub(elapsed))
        };

        Ok(RateLimitOutcome {
            allowed,
            limit: policy.max_points,
            remaining,
            retry_after_seconds,
        })
    }

    async fn sweep(&self, policy: &RateLimitPolicy) -> AppResult<usize> {
        let now = Instant::now();
        let elapsed: Vec<_> = self
            .buckets
            .iter()
            .filter(|(_, bucket)| bucket.window_elapsed(now, policy.window))
            .map(|(key, _)| key)
            .collect();

        for key in &elapsed {
            self.buckets.invalidate(key.as_str()).await;
        }
        self.buckets.run_pending_tasks().await;

        if !elapsed.is_empty() {
            debug!(removed = elapsed.len(), "Dropped elapsed rate buckets");
        }
        Ok(elapsed.len())
    }

    async fn tracked_keys(&self) -> AppResult<usize> {
        self.buckets.run_pending_tasks().await;
        Ok(self.buckets.entry_count() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy::new(3, WINDOW)
    }

    async fn consumed(store: &MemoryRateLimitStore, key: &str) -> Option<u64> {
        store.buckets.get(key).await.map(|b| b.points_consumed)
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_seconds(Duration::from_millis(59_001)), 60);
        assert_eq!(retry_after_seconds(Duration::from_secs(12)), 12);
        assert_eq!(retry_after_seconds(Duration::ZERO), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_counts_down_with_window() {
        let store = MemoryRateLimitStore::new(10, WINDOW);
        let policy = RateLimitPolicy::new(1, WINDOW);
        store.consume("k", 1, &policy).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        let denied = store.consume("k", 1, &policy).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_seconds, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_requests_are_not_rolled_back() {
        let store = MemoryRateLimitStore::new(10, WINDOW);
        let policy = policy();
        for _ in 0..5 {
            store.consume("k", 1, &policy).await.unwrap();
        }
        assert_eq!(consumed(&store, "k").await, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_window_resets_before_accounting() {
        let store = MemoryRateLimitStore::new(10, WINDOW);
        let policy = policy();
        for _ in 0..4 {
            store.consume("k", 1, &policy).await.unwrap();
        }
        tokio::time::advance(WINDOW).await;

        let outcome = store.consume("k", 1, &policy).await.unwrap();
        assert!(outcome.allowed);
        assert_eq!(outcome.remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_elapsed_buckets() {
        let store = MemoryRateLimitStore::new(10, WINDOW);
        let policy = policy();
        store.consume("old", 1, &policy).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        store.consume("fresh", 1, &policy).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.sweep(&policy).await.unwrap(), 1);
        assert_eq!(store.tracked_keys().await.unwrap(), 1);
        assert_eq!(consumed(&store, "fresh").await, Some(1));
    }

    #[tokio::test]
    async fn test_cap_evicts_least_recently_charged() {
        let store = MemoryRateLimitStore::new(2, WINDOW);
        let policy = policy();
        store.consume("a", 1, &policy).await.unwrap();
        store.consume("b", 1, &policy).await.unwrap();
        store.consume("c", 1, &policy).await.unwrap();

        assert_eq!(store.tracked_keys().await.unwrap(), 2);
        assert_eq!(consumed(&store, "a").await, None);
        assert_eq!(consumed(&store, "c").await, Some(1));
    }

    #[tokio::test]
    async fn test_flood_of_new_keys_stays_bounded() {
        let store = MemoryRateLimitStore::new(100, WINDOW);
        let policy = policy();
        for i in 0..5_000 {
            let key = format!("10.0.{}.{}", i / 256, i % 256);
            assert!(store.consume(&key, 1, &policy).await.unwrap().allowed);
        }

        assert!(store.tracked_keys().await.unwrap() <= 100);
    }

    #[tokio::test]
    async fn test_known_key_keeps_its_count_at_cap() {
        let store = MemoryRateLimitStore::new(1, WINDOW);
        let policy = policy();
        store.consume("a", 1, &policy).await.unwrap();
        let outcome = store.consume("a", 1, &policy).await.unwrap();
        assert_eq!(outcome.remaining, 1);
    }
}
