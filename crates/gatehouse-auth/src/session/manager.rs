//! Session lifecycle: login, refresh, logout.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use gatehouse_core::GateError;
use gatehouse_core::config::AuthConfig;
use gatehouse_core::types::AccountId;
use gatehouse_database::AccountRepository;
use gatehouse_entity::account::Account;

use crate::jwt::TokenCodec;
use crate::password::PasswordHasher;

use super::store::RefreshTokenStore;

/// Access and refresh tokens handed to the client.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Short-lived signed access token.
    pub access_token: String,
    /// Long-lived opaque refresh token.
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// Issued tokens.
    pub tokens: TokenPair,
    /// The authenticated account.
    pub account: Account,
}

/// Drives the login, refresh, and logout flows.
#[derive(Debug, Clone)]
pub struct SessionManager {
    accounts: Arc<dyn AccountRepository>,
    refresh_tokens: Arc<RefreshTokenStore>,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
    access_ttl: Duration,
}

impl SessionManager {
    /// Creates a manager.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        refresh_tokens: Arc<RefreshTokenStore>,
        codec: Arc<TokenCodec>,
        access_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            refresh_tokens,
            codec,
            hasher: PasswordHasher::new(),
            access_ttl,
        }
    }

    /// Creates a manager with the access TTL from configuration.
    pub fn from_config(
        accounts: Arc<dyn AccountRepository>,
        refresh_tokens: Arc<RefreshTokenStore>,
        codec: Arc<TokenCodec>,
        config: &AuthConfig,
    ) -> Self {
        Self::new(
            accounts,
            refresh_tokens,
            codec,
            Duration::minutes(config.access_token_ttl_minutes as i64),
        )
    }

    /// The refresh token store.
    pub fn refresh_tokens(&self) -> &Arc<RefreshTokenStore> {
        &self.refresh_tokens
    }

    /// Verifies credentials and issues a token pair.
    ///
    /// Unknown login and wrong secret are indistinguishable to the caller.
    pub async fn login(&self, login: &str, secret: &str) -> Result<LoginResult, GateError> {
        let Some(account) = self.accounts.find_account_by_login(login).await? else {
            debug!(login = %login, "Login for unknown account");
            self.hasher.verify_placeholder(secret);
            return Err(GateError::InvalidCredentials);
        };

        if !self.hasher.verify_secret(secret, &account.hashed_secret)? {
            warn!(account_id = %account.id, "Login with wrong secret");
            return Err(GateError::InvalidCredentials);
        }

        if !account.verified {
            return Err(GateError::forbidden("Account is not verified"));
        }

        let tokens = self.issue_pair(&account).await?;
        info!(account_id = %account.id, role = %account.role, "Login successful");
        Ok(LoginResult { tokens, account })
    }

    /// Rotates a refresh token and issues a new pair with the account's
    /// current role.
    ///
    /// Of concurrent refreshes presenting the same value, exactly one wins.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, GateError> {
        let consumed = self.refresh_tokens.consume(refresh_token).await?;

        let Some(account) = self.accounts.find_account_by_id(consumed.account_id).await? else {
            debug!(account_id = %consumed.account_id, "Refresh for deleted account");
            return Err(GateError::RefreshTokenInvalid);
        };

        let tokens = self.issue_pair(&account).await?;
        debug!(account_id = %account.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Revokes one refresh token. Unknown values are not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), GateError> {
        if self.refresh_tokens.revoke(refresh_token).await? {
            debug!("Refresh token revoked");
        }
        Ok(())
    }

    /// Revokes every refresh token of an account.
    pub async fn logout_all(&self, account_id: AccountId) -> Result<u64, GateError> {
        let revoked = self.refresh_tokens.revoke_all(account_id).await?;
        info!(account_id = %account_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    async fn issue_pair(&self, account: &Account) -> Result<TokenPair, GateError> {
        let access = self.codec.issue(account.id, account.role, self.access_ttl)?;
        let (refresh_token, refresh_row) = self.refresh_tokens.issue(account.id).await?;
        Ok(TokenPair {
            access_token: access.token,
            refresh_token,
            token_type: "Bearer",
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh_row.expires_at,
        })
    }
}
