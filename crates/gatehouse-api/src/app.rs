//! Application wiring and server lifecycle.
//!
//! [`assemble`] builds the gate and session components from configuration
//! and the persistence collaborators; [`run_server`] picks those
//! collaborators per the configured providers, serves HTTP, and runs the
//! background sweepers until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use gatehouse_auth::{
    AccessGuard, Authenticator, MemoryRateLimitStore, PermissionResolver, RateLimitSweeper,
    RateLimiter, RefreshTokenCleanup, RefreshTokenStore, RequestGate, SessionManager, TokenCodec,
};
use gatehouse_core::config::{AppConfig, DatabaseProvider, RateLimitBackend};
use gatehouse_core::error::AppError;
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::{RateLimitPolicy, RateLimitStore};
use gatehouse_database::memory::{MemoryAccountRepository, MemoryRefreshTokenRepository};
use gatehouse_database::repositories::{PgAccountRepository, PgRefreshTokenRepository};
use gatehouse_database::{AccountRepository, DatabasePool, RefreshTokenRepository};

use crate::router::build_router;
use crate::state::AppState;

/// Everything the server runs: the shared state plus the background tasks.
#[derive(Debug, Clone)]
pub struct Components {
    /// State handed to the router.
    pub state: AppState,
    /// Idle rate bucket eviction.
    pub sweeper: RateLimitSweeper,
    /// Expired refresh token purge.
    pub cleanup: RefreshTokenCleanup,
}

/// Builds the gate, the session manager, and the background tasks.
pub fn assemble(
    config: AppConfig,
    accounts: Arc<dyn AccountRepository>,
    refresh_repo: Arc<dyn RefreshTokenRepository>,
    rate_store: Arc<dyn RateLimitStore>,
) -> AppResult<Components> {
    let codec = Arc::new(TokenCodec::from_config(&config.auth)?);

    let refresh_ttl = chrono::Duration::hours(config.auth.refresh_token_ttl_hours as i64);
    let refresh_tokens = Arc::new(RefreshTokenStore::new(refresh_repo, refresh_ttl));
    let session_manager = Arc::new(SessionManager::from_config(
        Arc::clone(&accounts),
        Arc::clone(&refresh_tokens),
        Arc::clone(&codec),
        &config.auth,
    ));

    let limiter = RateLimiter::new(rate_store, RateLimitPolicy::from_config(&config.rate_limit));
    let resolver = Arc::new(PermissionResolver::new(Arc::clone(&accounts)));
    let gate = Arc::new(RequestGate::new(
        limiter.clone(),
        Authenticator::new(codec),
        AccessGuard::new(resolver),
        config.gate.lookup_timeout(),
    ));

    let sweeper = RateLimitSweeper::new(
        limiter,
        Duration::from_secs(config.rate_limit.sweep_interval_seconds),
    );
    let cleanup = RefreshTokenCleanup::new(
        refresh_tokens,
        Duration::from_secs(config.auth.refresh_cleanup_interval_seconds),
    );

    let state = AppState {
        config: Arc::new(config),
        gate,
        session_manager,
        accounts,
    };

    Ok(Components {
        state,
        sweeper,
        cleanup,
    })
}

/// Serves the gate until SIGINT/SIGTERM, then drains the background tasks.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting Gatehouse v{}", env!("CARGO_PKG_VERSION"));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    let (accounts, refresh_repo, db) = connect_repositories(&config).await?;
    let served = serve_until_shutdown(listener, config, accounts, refresh_repo).await;

    if let Some(db) = db {
        db.close().await;
    }

    served
}

/// Serves on a bound listener, then stops the background tasks.
///
/// Background tasks start only once the listener exists, so every exit
/// path below leaves nothing running.
async fn serve_until_shutdown(
    listener: tokio::net::TcpListener,
    config: AppConfig,
    accounts: Arc<dyn AccountRepository>,
    refresh_repo: Arc<dyn RefreshTokenRepository>,
) -> Result<(), AppError> {
    let rate_store = connect_rate_store(&config).await?;
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let components = assemble(config, accounts, refresh_repo, rate_store)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = components.sweeper;
    let sweeper_rx = shutdown_rx.clone();
    let sweeper_handle = tokio::spawn(async move { sweeper.run(sweeper_rx).await });

    let cleanup = components.cleanup;
    let cleanup_handle = tokio::spawn(async move { cleanup.run(shutdown_rx).await });

    if let Ok(local) = listener.local_addr() {
        info!("Gatehouse listening on {}", local);
    }

    let app = build_router(components.state);
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")));

    let drained = tokio::time::timeout(grace, async {
        let _ = sweeper_handle.await;
        let _ = cleanup_handle.await;
    })
    .await;
    if drained.is_err() {
        warn!(
            grace_seconds = grace.as_secs(),
            "Background tasks did not stop within the grace period"
        );
    }

    served
}

type Repositories = (
    Arc<dyn AccountRepository>,
    Arc<dyn RefreshTokenRepository>,
    Option<DatabasePool>,
);

async fn connect_repositories(config: &AppConfig) -> AppResult<Repositories> {
    match config.database.provider {
        DatabaseProvider::Memory => {
            warn!("Using the in-memory account store; accounts must be seeded at startup");
            Ok((
                Arc::new(MemoryAccountRepository::new()),
                Arc::new(MemoryRefreshTokenRepository::new()),
                None,
            ))
        }
        DatabaseProvider::Postgres => {
            let db = DatabasePool::connect_and_migrate(&config.database).await?;
            Ok((
                Arc::new(PgAccountRepository::new(db.pool().clone())),
                Arc::new(PgRefreshTokenRepository::new(db.pool().clone())),
                Some(db),
            ))
        }
    }
}

async fn connect_rate_store(config: &AppConfig) -> AppResult<Arc<dyn RateLimitStore>> {
    match config.rate_limit.backend {
        RateLimitBackend::Memory => Ok(Arc::new(MemoryRateLimitStore::from_config(
            &config.rate_limit,
        ))),
        #[cfg(feature = "redis-limiter")]
        RateLimitBackend::Redis => {
            use gatehouse_auth::rate_limit::redis::RedisRateLimitStore;

            let store = RedisRateLimitStore::connect(&config.rate_limit.redis_url).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis-limiter"))]
        RateLimitBackend::Redis => Err(AppError::configuration(
            "rate_limit.backend = \"redis\" requires the redis-limiter feature",
        )),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "s".repeat(48);
        config
    }

    #[test]
    fn test_assemble_with_memory_collaborators() {
        let config = config();
        let rate_store = Arc::new(MemoryRateLimitStore::from_config(&config.rate_limit));
        let components = assemble(
            config,
            Arc::new(MemoryAccountRepository::new()),
            Arc::new(MemoryRefreshTokenRepository::new()),
            rate_store,
        )
        .expect("assemble");

        assert_eq!(components.state.gate.limiter().policy().max_points, 100);
    }

    #[test]
    fn test_assemble_rejects_unsupported_algorithm() {
        let mut config = config();
        config.auth.jwt_algorithm = "RS256".to_string();
        let rate_store = Arc::new(MemoryRateLimitStore::from_config(&config.rate_limit));
        let result = assemble(
            config,
            Arc::new(MemoryAccountRepository::new()),
            Arc::new(MemoryRefreshTokenRepository::new()),
            rate_store,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_server_fails_fast_when_port_is_taken() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = config();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = taken.local_addr().unwrap().port();

        let result = tokio::time::timeout(Duration::from_secs(5), run_server(config))
            .await
            .expect("bind failure should return promptly");
        assert!(result.is_err());
    }
}
