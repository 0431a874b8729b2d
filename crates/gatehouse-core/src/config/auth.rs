//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Placeholder secret shipped in the defaults; never use it in production.
pub const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION_CHANGE_ME_IN_PRODUCTION";

/// Token signing and lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Signing algorithm: `HS256`, `HS384`, or `HS512`.
    #[serde(default = "default_algorithm")]
    pub jwt_algorithm: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_hours: u64,
    /// How often expired refresh tokens are purged, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub refresh_cleanup_interval_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_algorithm: default_algorithm(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_hours: default_refresh_ttl(),
            refresh_cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

fn default_jwt_secret() -> String {
    PLACEHOLDER_JWT_SECRET.to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    24 * 7
}

fn default_cleanup_interval() -> u64 {
    3600
}
