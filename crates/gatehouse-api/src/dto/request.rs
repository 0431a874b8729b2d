//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account login.
    #[validate(length(min = 1, max = 255, message = "Login is required"))]
    pub login: String,
    /// Account secret.
    #[validate(length(min = 1, message = "Secret is required"))]
    pub secret: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Opaque refresh token.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogoutRequest {
    /// Opaque refresh token to revoke.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}
