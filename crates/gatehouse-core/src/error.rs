//! Error types for Gatehouse.
//!
//! Two layers live here:
//!
//! - [`AppError`] carries infrastructure faults (repository, store,
//!   configuration) with a coarse [`ErrorKind`] and an optional source.
//! - [`GateError`] is the closed set of outcomes a gating decision or a
//!   session flow can end in. Every variant maps to exactly one HTTP status.
//!   Infrastructure faults enter it through [`GateError::Internal`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of an infrastructure error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The requested record was not found.
    NotFound,
    /// A write referenced a record that does not exist or violated a constraint.
    Conflict,
    /// Input validation failed.
    Validation,
    /// An internal fault occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A cache or shared-store error occurred.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A dependency is temporarily unavailable.
    ServiceUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// Infrastructure error used by repositories, stores, and configuration.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of a failed gating decision or session flow.
///
/// The set is closed: the HTTP layer matches on it exhaustively.
#[derive(Debug, Clone, Error)]
pub enum GateError {
    /// No `Authorization` header, or a scheme other than `Bearer`.
    #[error("Authentication credentials were not provided")]
    CredentialsMissing,

    /// The bearer token failed verification. The cause is deliberately
    /// collapsed; only expiry is distinguishable.
    #[error("Invalid or expired access token")]
    Unauthorized {
        /// Whether the token was rejected only because it expired.
        expired: bool,
    },

    /// Login failed: unknown login or wrong secret.
    #[error("Invalid login or secret")]
    InvalidCredentials,

    /// The refresh token is absent, already rotated, or expired.
    #[error("Refresh token is invalid or expired")]
    RefreshTokenInvalid,

    /// The token is valid but its subject no longer exists.
    #[error("Account no longer exists")]
    AccountNotFound,

    /// Role or permission/scope mismatch.
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Human-readable reason naming the missing role or permission.
        reason: String,
    },

    /// The client exhausted its point budget for the current window.
    #[error("Too many requests, retry after {retry_after_seconds}s")]
    TooManyRequests {
        /// Seconds until the current window rolls over.
        retry_after_seconds: u64,
    },

    /// Request shape validation failed.
    #[error("Request validation failed")]
    Validation {
        /// Every failing field.
        errors: Vec<FieldError>,
    },

    /// A gate stage did not finish within the configured deadline.
    #[error("Gate stage '{stage}' timed out")]
    GatewayTimeout {
        /// The stage that timed out.
        stage: &'static str,
    },

    /// Unexpected infrastructure fault.
    #[error(transparent)]
    Internal(#[from] AppError),
}

impl GateError {
    /// Creates a forbidden error with the given reason.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Creates a validation error for a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Returns the HTTP status code this outcome surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::CredentialsMissing
            | Self::Unauthorized { .. }
            | Self::InvalidCredentials
            | Self::RefreshTokenInvalid => 401,
            Self::AccountNotFound | Self::Forbidden { .. } => 403,
            Self::TooManyRequests { .. } => 429,
            Self::Validation { .. } => 400,
            Self::GatewayTimeout { .. } => 504,
            Self::Internal(_) => 500,
        }
    }
}
