//! Periodic eviction of idle rate buckets.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, trace};

use super::limiter::RateLimiter;

/// Background task that sweeps elapsed buckets on an interval.
#[derive(Debug, Clone)]
pub struct RateLimitSweeper {
    limiter: RateLimiter,
    interval: Duration,
}

impl RateLimitSweeper {
    /// Creates a sweeper running every `interval`, at least once a second.
    pub fn new(limiter: RateLimiter, interval: Duration) -> Self {
        Self {
            limiter,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Runs until the shutdown signal flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_seconds = self.interval.as_secs(),
            "Rate limit sweeper started"
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.limiter.sweep().await {
                        Ok(0) => trace!("No idle rate buckets"),
                        Ok(removed) => info!(removed, "Swept idle rate buckets"),
                        Err(e) => error!(error = %e, "Rate bucket sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Rate limit sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gatehouse_core::traits::RateLimitPolicy;

    use super::*;
    use crate::rate_limit::MemoryRateLimitStore;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_and_stops_on_shutdown() {
        let store = Arc::new(MemoryRateLimitStore::new(100, Duration::from_secs(60)));
        let limiter = RateLimiter::new(
            store.clone(),
            RateLimitPolicy::new(10, Duration::from_secs(60)),
        );
        limiter.consume("idle", 1).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let sweeper = RateLimitSweeper::new(limiter.clone(), Duration::from_secs(30));
        let handle = tokio::spawn(async move { sweeper.run(rx).await });

        time::sleep(Duration::from_secs(91)).await;
        assert_eq!(limiter.store().tracked_keys().await.unwrap(), 0);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised_to_one_second() {
        let limiter = RateLimiter::new(
            Arc::new(MemoryRateLimitStore::new(10, Duration::from_secs(60))),
            RateLimitPolicy::new(10, Duration::from_secs(60)),
        );
        let sweeper = RateLimitSweeper::new(limiter, Duration::ZERO);
        assert_eq!(sweeper.interval, Duration::from_secs(1));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { sweeper.run(rx).await });
        time::sleep(Duration::from_secs(3)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
