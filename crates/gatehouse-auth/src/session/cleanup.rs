//! Periodic deletion of expired refresh tokens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, trace};

use gatehouse_core::result::AppResult;

use super::store::RefreshTokenStore;

/// Background task purging expired refresh token rows.
#[derive(Debug, Clone)]
pub struct RefreshTokenCleanup {
    store: Arc<RefreshTokenStore>,
    interval: Duration,
}

impl RefreshTokenCleanup {
    /// Creates a cleanup task running every `interval`.
    pub fn new(store: Arc<RefreshTokenStore>, interval: Duration) -> Self {
        Self {
            store,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Runs one cleanup cycle. Returns the number of rows removed.
    pub async fn run_cleanup(&self) -> AppResult<u64> {
        let removed = self.store.purge_expired().await?;
        if removed == 0 {
            trace!("No expired refresh tokens");
        } else {
            info!(removed, "Expired refresh tokens purged");
        }
        Ok(removed)
    }

    /// Runs until the shutdown signal flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_seconds = self.interval.as_secs(),
            "Refresh token cleanup started"
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, "Refresh token cleanup failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Refresh token cleanup shutting down");
                        break;
                    }
                }
            }
        }
    }
}
