//! `AuthClaims` extractor: the claims the gate middleware admitted.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use gatehouse_auth::Claims;
use gatehouse_core::GateError;

use crate::error::ApiError;

/// Verified claims of the current request.
///
/// Only available on routes behind an authenticated gate rule; elsewhere
/// extraction fails with `CredentialsMissing`.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl std::ops::Deref for AuthClaims {
    type Target = Claims;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthClaims)
            .ok_or(ApiError(GateError::CredentialsMissing))
    }
}
