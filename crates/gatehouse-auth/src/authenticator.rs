//! Bearer header authentication.

use std::sync::Arc;

use tracing::debug;

use gatehouse_core::GateError;

use crate::jwt::{Claims, TokenCodec, TokenError};

/// Literal scheme prefix of an accepted `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Turns a raw `Authorization` header value into verified claims.
///
/// Never touches persistence.
#[derive(Debug, Clone)]
pub struct Authenticator {
    codec: Arc<TokenCodec>,
}

impl Authenticator {
    /// Creates an authenticator over a shared codec.
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Verifies the header and returns the token's claims.
    ///
    /// A missing header or any scheme other than `Bearer ` is
    /// [`GateError::CredentialsMissing`]. Every verification failure collapses
    /// into [`GateError::Unauthorized`], flagging only expiry.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Claims, GateError> {
        let token = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .ok_or(GateError::CredentialsMissing)?;

        self.codec.verify(token).map_err(|e| {
            debug!(reason = %e, "Bearer token rejected");
            GateError::Unauthorized {
                expired: e == TokenError::Expired,
            }
        })
    }
}
