//! HMAC-signed JWT issuance and verification.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use thiserror::Error;

use gatehouse_core::config::AuthConfig;
use gatehouse_core::error::AppError;
use gatehouse_core::types::AccountId;
use gatehouse_entity::account::AccountRole;

use super::claims::Claims;

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not a three-segment JWT with decodable header and claims.
    #[error("malformed token")]
    Malformed,
    /// The `exp` claim is in the past.
    #[error("token expired")]
    Expired,
    /// Wrong algorithm or signature mismatch.
    #[error("invalid token signature")]
    InvalidSignature,
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact serialized JWT.
    pub token: String,
    /// The signed claims.
    pub claims: Claims,
    /// Expiry as a timestamp.
    pub expires_at: chrono::DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Signs and verifies access tokens with a single HMAC key.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec for `secret` and an HMAC algorithm name.
    pub fn new(secret: &[u8], algorithm: &str) -> Result<Self, AppError> {
        let algorithm = match Algorithm::from_str(algorithm) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
            _ => {
                return Err(AppError::configuration(format!(
                    "Unsupported token algorithm '{algorithm}'"
                )));
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Creates a codec from the `auth` configuration section.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::new(config.jwt_secret.as_bytes(), &config.jwt_algorithm)
    }

    /// The configured signing algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Signs arbitrary claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }

    /// Issues a token for `subject` valid for `ttl` from now.
    pub fn issue(
        &self,
        subject: AccountId,
        role: AccountRole,
        ttl: Duration,
    ) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = Claims {
            sub: subject,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.encode(&claims)?;
        Ok(IssuedToken {
            token,
            claims,
            expires_at,
        })
    }

    /// Verifies a compact token and returns its claims.
    ///
    /// Expiry is checked before the signature, so an expired token is
    /// reported as [`TokenError::Expired`] whatever key signed it.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let header: RawHeader = decode_segment(header)?;
        let claims: Claims = decode_segment(payload)?;

        if claims.is_expired_at(Utc::now().timestamp()) {
            return Err(TokenError::Expired);
        }

        if Algorithm::from_str(&header.alg).ok() != Some(self.algorithm) {
            return Err(TokenError::InvalidSignature);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidSignature
                | JwtErrorKind::InvalidAlgorithm
                | JwtErrorKind::InvalidAlgorithmName
                | JwtErrorKind::Base64(_) => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "HS256").unwrap()
    }

    #[test]
    fn test_issue_then_verify_round_trips_claims() {
        let codec = codec();
        let subject = AccountId::new();
        let issued = codec
            .issue(subject, AccountRole::Manager, Duration::minutes(15))
            .unwrap();

        let claims = codec.verify(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.role, AccountRole::Manager);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let codec = codec();
        let issued = codec
            .issue(AccountId::new(), AccountRole::User, Duration::seconds(-60))
            .unwrap();
        assert_eq!(codec.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_token_with_foreign_signature_still_reports_expired() {
        let foreign = TokenCodec::new(b"ffffffffffffffffffffffffffffffff", "HS512").unwrap();
        let issued = foreign
            .issue(AccountId::new(), AccountRole::User, Duration::seconds(-60))
            .unwrap();
        assert_eq!(codec().verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_foreign_key_is_invalid_signature() {
        let foreign = TokenCodec::new(b"ffffffffffffffffffffffffffffffff", "HS256").unwrap();
        let issued = foreign
            .issue(AccountId::new(), AccountRole::User, Duration::minutes(5))
            .unwrap();
        assert_eq!(
            codec().verify(&issued.token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_foreign_algorithm_is_invalid_signature() {
        let other = TokenCodec::new(SECRET, "HS512").unwrap();
        let issued = other
            .issue(AccountId::new(), AccountRole::User, Duration::minutes(5))
            .unwrap();
        assert_eq!(
            codec().verify(&issued.token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_alg_none_is_invalid_signature() {
        let claims = Claims {
            sub: AccountId::new(),
            role: AccountRole::Admin,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 300,
        };
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let token = format!("{header}.{payload}.");
        assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_is_invalid_signature() {
        let codec = codec();
        let issued = codec
            .issue(AccountId::new(), AccountRole::User, Duration::minutes(5))
            .unwrap();
        let mut forged = issued.claims.clone();
        forged.role = AccountRole::Manager;
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let parts: Vec<&str> = issued.token.split('.').collect();
        let token = format!("{}.{payload}.{}", parts[0], parts[2]);
        assert_eq!(codec.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec();
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
        assert_eq!(codec.verify("abc"), Err(TokenError::Malformed));
        assert_eq!(codec.verify("a.b"), Err(TokenError::Malformed));
        assert_eq!(codec.verify("a.b.c.d"), Err(TokenError::Malformed));
        assert_eq!(codec.verify("!!!.???.sig"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_rejects_non_hmac_algorithm() {
        assert!(TokenCodec::new(SECRET, "RS256").is_err());
        assert!(TokenCodec::new(SECRET, "none").is_err());
    }
}
