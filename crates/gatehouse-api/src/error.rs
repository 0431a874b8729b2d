//! Maps gate outcomes to HTTP responses.

use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use gatehouse_core::error::{AppError, FieldError};
use gatehouse_core::GateError;

/// Error body for 400, 401, 403, 500, and 504.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Present on 401 for rejected tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
    /// Present on 400.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Error body for 429.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitedBody {
    /// Human-readable message.
    pub message: String,
}

/// HTTP-facing wrapper around [`GateError`].
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(GateError::Internal(err))
    }
}

impl ApiError {
    fn body(message: impl Into<String>) -> ErrorBody {
        ErrorBody {
            success: false,
            message: message.into(),
            expired: None,
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.0 {
            GateError::TooManyRequests {
                retry_after_seconds,
            } => {
                let body = RateLimitedBody {
                    message: format!(
                        "Too many requests, please retry after {retry_after_seconds} seconds"
                    ),
                };
                let mut response = (status, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_seconds));
                response
            }
            GateError::Unauthorized { expired } => {
                let message = if expired {
                    "Access token has expired"
                } else {
                    "Invalid access token"
                };
                let mut body = Self::body(message);
                body.expired = Some(expired);
                (status, Json(body)).into_response()
            }
            GateError::Validation { errors } => {
                let mut body = Self::body("Request validation failed");
                body.errors = Some(errors);
                (status, Json(body)).into_response()
            }
            GateError::Internal(err) => {
                tracing::error!(
                    kind = %err.kind,
                    error = %err.message,
                    source = ?err.source,
                    "Internal server error"
                );
                (status, Json(Self::body("Internal server error"))).into_response()
            }
            GateError::GatewayTimeout { stage } => {
                tracing::error!(stage, "Gate stage timed out");
                (status, Json(Self::body("Upstream lookup timed out"))).into_response()
            }
            other @ (GateError::CredentialsMissing
            | GateError::InvalidCredentials
            | GateError::RefreshTokenInvalid
            | GateError::AccountNotFound
            | GateError::Forbidden { .. }) => {
                (status, Json(Self::body(other.to_string()))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn render(err: GateError) -> (StatusCode, Option<HeaderValue>, Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let retry = response.headers().get(RETRY_AFTER).cloned();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, retry, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_too_many_requests_sets_retry_after() {
        let (status, retry, body) = render(GateError::TooManyRequests {
            retry_after_seconds: 42,
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry.unwrap().to_str().unwrap(), "42");
        assert!(body["message"].as_str().unwrap().contains("42"));
        assert!(body.get("success").is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_carries_expired_flag() {
        let (status, _, body) = render(GateError::Unauthorized { expired: true }).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["expired"], true);
    }

    #[tokio::test]
    async fn test_credentials_missing_has_no_expired_flag() {
        let (status, _, body) = render(GateError::CredentialsMissing).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("expired").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_does_not_leak() {
        let (status, _, body) =
            render(GateError::Internal(AppError::database("password=hunter2"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let (status, _, body) = render(GateError::invalid_field("login", "is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "login");
    }

    #[tokio::test]
    async fn test_gateway_timeout() {
        let (status, _, body) = render(GateError::GatewayTimeout { stage: "authorize" }).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["success"], false);
    }
}
