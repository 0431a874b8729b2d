//! The request gate: rate limit, authenticate, authorize, admit.
//!
//! Stages run in order and the first failure is terminal:
//! 1. Rate limit, keyed by client: `TooManyRequests`
//! 2. Authentication (skipped for public rules): `CredentialsMissing`,
//!    `Unauthorized`
//! 3. Authorization: a malformed unit path parameter is `Validation`, then
//!    `AccountNotFound`, `Forbidden`
//! 4. Admission: the verified claims are handed to the handler
//!
//! Stages 1 and 3 touch storage and run under the lookup timeout; expiry
//! is `GatewayTimeout`. Nothing is retried.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use gatehouse_core::GateError;
use gatehouse_core::traits::RateLimitOutcome;
use gatehouse_core::types::UnitId;

use crate::authenticator::Authenticator;
use crate::jwt::Claims;
use crate::rate_limit::RateLimiter;
use crate::rbac::{AccessGuard, AccessRequirement};

/// Access rule attached to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Rate limited only.
    Public,
    /// Requires a valid bearer token and the given requirement.
    Authenticated(AccessRequirement),
}

/// Unit path parameter of a unit-scoped route, as received.
///
/// Parsed only once the request is charged and authenticated, so malformed
/// units cannot bypass rate limiting or leak validation details.
#[derive(Debug, Clone, Copy)]
pub struct UnitParam<'a> {
    /// Path parameter name, reported as the failing field.
    pub name: &'a str,
    /// Raw value; `None` when the route did not capture it.
    pub raw: Option<&'a str>,
}

impl UnitParam<'_> {
    /// Parses the raw value into a unit id.
    pub fn parse(&self) -> Result<UnitId, GateError> {
        let raw = self
            .raw
            .ok_or_else(|| GateError::invalid_field(self.name, "is required"))?;
        raw.parse::<UnitId>()
            .map_err(|_| GateError::invalid_field(self.name, "must be an integer unit id"))
    }
}

/// Everything the gate needs to judge one request.
#[derive(Debug, Clone)]
pub struct GateRequest<'a> {
    /// Rate-limit key, usually the client IP.
    pub client_key: &'a str,
    /// Raw `Authorization` header value.
    pub authorization: Option<&'a str>,
    /// The route's rule.
    pub rule: &'a AccessRule,
    /// Unit path parameter, if the route is unit-scoped.
    pub unit: Option<UnitParam<'a>>,
    /// Points this request costs.
    pub cost: u32,
}

/// A request the gate let through.
#[derive(Debug, Clone)]
pub struct Admission {
    /// Verified identity; `None` on public routes.
    pub claims: Option<Claims>,
    /// Rate-limit state after charging this request.
    pub quota: RateLimitOutcome,
}

/// Composes the limiter, authenticator, and access guard.
#[derive(Debug, Clone)]
pub struct RequestGate {
    limiter: RateLimiter,
    authenticator: Authenticator,
    guard: AccessGuard,
    lookup_timeout: Duration,
}

impl RequestGate {
    /// Creates a gate.
    pub fn new(
        limiter: RateLimiter,
        authenticator: Authenticator,
        guard: AccessGuard,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            authenticator,
            guard,
            lookup_timeout,
        }
    }

    /// The rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The access guard.
    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// Runs every stage for `request`.
    pub async fn admit(&self, request: GateRequest<'_>) -> Result<Admission, GateError> {
        let quota = self
            .with_deadline(
                "rate_limit",
                self.limiter.consume(request.client_key, request.cost),
            )
            .await??;

        if !quota.allowed {
            return Err(GateError::TooManyRequests {
                retry_after_seconds: quota.retry_after_seconds,
            });
        }

        let requirement = match request.rule {
            AccessRule::Public => {
                request.unit.as_ref().map(UnitParam::parse).transpose()?;
                return Ok(Admission {
                    claims: None,
                    quota,
                });
            }
            AccessRule::Authenticated(requirement) => requirement,
        };

        let claims = self.authenticator.authenticate(request.authorization)?;
        let unit = request.unit.as_ref().map(UnitParam::parse).transpose()?;

        self.with_deadline(
            "authorize",
            self.guard.authorize(&claims, requirement, unit),
        )
        .await??;

        debug!(account_id = %claims.sub, "Request admitted");
        Ok(Admission {
            claims: Some(claims),
            quota,
        })
    }

    async fn with_deadline<T, E>(
        &self,
        stage: &'static str,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<Result<T, GateError>, GateError>
    where
        GateError: From<E>,
    {
        match tokio::time::timeout(self.lookup_timeout, fut).await {
            Ok(result) => Ok(result.map_err(GateError::from)),
            Err(_) => {
                warn!(
                    stage,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Gate stage timed out"
                );
                Err(GateError::GatewayTimeout { stage })
            }
        }
    }
}
