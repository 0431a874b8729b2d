//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files plus `GATEHOUSE__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section.

pub mod app;
pub mod auth;
pub mod database;
pub mod gate;
pub mod logging;
pub mod rate_limit;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use self::app::ServerConfig;
pub use self::auth::AuthConfig;
pub use self::database::{DatabaseConfig, DatabaseProvider};
pub use self::gate::GateConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::{RateLimitBackend, RateLimitConfig};

use crate::error::AppError;

/// Minimum accepted length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signing algorithms the token codec accepts.
pub const SUPPORTED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence collaborator settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token signing settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate limiter settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Request gate settings.
    #[serde(default)]
    pub gate: GateConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml`, the environment overlay
    /// `config/{env}.toml`, and environment variables prefixed with
    /// `GATEHOUSE__` (e.g. `GATEHOUSE__AUTH__JWT_SECRET`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GATEHOUSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the gate cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.auth.jwt_secret == auth::PLACEHOLDER_JWT_SECRET {
            warn!("auth.jwt_secret is the shipped placeholder; set GATEHOUSE__AUTH__JWT_SECRET");
        }
        if !SUPPORTED_ALGORITHMS.contains(&self.auth.jwt_algorithm.as_str()) {
            return Err(AppError::configuration(format!(
                "auth.jwt_algorithm '{}' is not one of {SUPPORTED_ALGORITHMS:?}",
                self.auth.jwt_algorithm
            )));
        }
        if self.auth.access_token_ttl_minutes == 0 || self.auth.refresh_token_ttl_hours == 0 {
            return Err(AppError::configuration("token TTLs must be positive"));
        }
        if self.rate_limit.max_points == 0 || self.rate_limit.window_seconds == 0 {
            return Err(AppError::configuration(
                "rate_limit.max_points and rate_limit.window_seconds must be positive",
            ));
        }
        if self.rate_limit.max_tracked_keys == 0 {
            return Err(AppError::configuration(
                "rate_limit.max_tracked_keys must be positive",
            ));
        }
        let intervals = [
            (
                "rate_limit.sweep_interval_seconds",
                self.rate_limit.sweep_interval_seconds,
            ),
            (
                "auth.refresh_cleanup_interval_seconds",
                self.auth.refresh_cleanup_interval_seconds,
            ),
            (
                "server.shutdown_grace_seconds",
                self.server.shutdown_grace_seconds,
            ),
            ("gate.lookup_timeout_ms", self.gate.lookup_timeout_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(AppError::configuration(format!("{name} must be positive")));
        }
        if self.rate_limit.backend == RateLimitBackend::Redis && self.rate_limit.redis_url.is_empty()
        {
            return Err(AppError::configuration(
                "rate_limit.redis_url is required for the redis backend",
            ));
        }
        if self.database.provider == DatabaseProvider::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required for the postgres provider",
            ));
        }
        Ok(())
    }
}
