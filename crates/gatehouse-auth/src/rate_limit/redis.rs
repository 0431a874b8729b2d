//! Redis-backed rate buckets using a Lua script for atomicity.
//!
//! Suitable for multi-instance deployments: every instance charges the
//! same counter, so the budget is global rather than per process.

#[cfg(feature = "redis-limiter")]
mod implementation {
    use async_trait::async_trait;
    use tracing::{error, info};

    use gatehouse_core::error::{AppError, ErrorKind};
    use gatehouse_core::result::AppResult;
    use gatehouse_core::traits::{RateLimitOutcome, RateLimitPolicy, RateLimitStore};

    /// Prefix of every bucket key.
    const KEY_PREFIX: &str = "gatehouse:ratelimit:";

    /// Lua script for an atomic fixed-window increment.
    ///
    /// KEYS[1] = bucket key
    /// ARGV[1] = cost
    /// ARGV[2] = window in milliseconds
    ///
    /// Returns `{points_consumed, ttl_ms}`.
    const CONSUME_SCRIPT: &str = r#"
        local key = KEYS[1]
        local cost = tonumber(ARGV[1])
        local window_ms = tonumber(ARGV[2])

        local consumed = redis.call('INCRBY', key, cost)
        local ttl = redis.call('PTTL', key)
        if ttl < 0 then
            redis.call('PEXPIRE', key, window_ms)
            ttl = window_ms
        end

        return {consumed, ttl}
    "#;

    /// Shared bucket store on Redis.
    #[derive(Clone)]
    pub struct RedisRateLimitStore {
        conn: redis::aio::ConnectionManager,
    }

    impl std::fmt::Debug for RedisRateLimitStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RedisRateLimitStore").finish()
        }
    }

    impl RedisRateLimitStore {
        /// Connects to Redis at `redis_url`.
        pub async fn connect(redis_url: &str) -> AppResult<Self> {
            let client = redis::Client::open(redis_url).map_err(|e| {
                AppError::with_source(ErrorKind::Cache, "Redis client creation failed", e)
            })?;

            let conn = client.get_connection_manager().await.map_err(|e| {
                AppError::with_source(ErrorKind::Cache, "Redis connection manager failed", e)
            })?;

            info!("Redis rate-limit store connected");
            Ok(Self { conn })
        }
    }

    #[async_trait]
    impl RateLimitStore for RedisRateLimitStore {
        async fn consume(
            &self,
            key: &str,
            cost: u32,
            policy: &RateLimitPolicy,
        ) -> AppResult<RateLimitOutcome> {
            let window_ms = policy.window.as_millis().max(1) as u64;
            let mut conn = self.conn.clone();

            let (consumed, ttl_ms): (i64, i64) = redis::Script::new(CONSUME_SCRIPT)
                .key(format!("{KEY_PREFIX}{key}"))
                .arg(cost)
                .arg(window_ms)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| {
                    error!(error = %e, "Rate-limit script failed");
                    AppError::with_source(ErrorKind::Cache, "Redis rate-limit script failed", e)
                })?;

            let consumed = consumed.max(0) as u64;
            let limit = u64::from(policy.max_points);
            let allowed = consumed <= limit;
            let retry_after_seconds = if allowed {
                0
            } else {
                (ttl_ms.max(0) as u64).div_ceil(1000).max(1)
            };

            Ok(RateLimitOutcome {
                allowed,
                limit: policy.max_points,
                remaining: limit.saturating_sub(consumed) as u32,
                retry_after_seconds,
            })
        }

        async fn sweep(&self, _policy: &RateLimitPolicy) -> AppResult<usize> {
            // Keys carry their own PEXPIRE.
            Ok(0)
        }

        // Diagnostic only: KEYS walks the whole keyspace.
        async fn tracked_keys(&self) -> AppResult<usize> {
            let mut conn = self.conn.clone();
            let keys: Vec<String> = redis::cmd("KEYS")
                .arg(format!("{KEY_PREFIX}*"))
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Cache, "Redis KEYS failed", e)
                })?;
            Ok(keys.len())
        }
    }
}

#[cfg(feature = "redis-limiter")]
pub use implementation::RedisRateLimitStore;
