//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use gatehouse_api::{assemble, build_router};
use gatehouse_auth::{Claims, MemoryRateLimitStore, PasswordHasher, TokenCodec};
use gatehouse_core::config::AppConfig;
use gatehouse_core::types::UnitId;
use gatehouse_database::memory::{MemoryAccountRepository, MemoryRefreshTokenRepository};
use gatehouse_entity::account::{Account, AccountRole};

pub const TEST_SECRET: &str = "integration-test-secret-with-enough-bytes";

/// Response captured from the router
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Account store the gate reads from
    pub accounts: Arc<MemoryAccountRepository>,
    /// Codec sharing the server's secret, for crafting tokens
    pub codec: TokenCodec,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a test application with default settings
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test application after adjusting the default config
    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = TEST_SECRET.to_string();
        adjust(&mut config);

        let accounts = Arc::new(MemoryAccountRepository::new());
        let components = assemble(
            config.clone(),
            accounts.clone(),
            Arc::new(MemoryRefreshTokenRepository::new()),
            Arc::new(MemoryRateLimitStore::from_config(&config.rate_limit)),
        )
        .expect("Failed to assemble test app");

        let codec = TokenCodec::new(TEST_SECRET.as_bytes(), &config.auth.jwt_algorithm)
            .expect("Failed to build codec");

        Self {
            router: build_router(components.state),
            accounts,
            codec,
            config,
        }
    }

    /// Create an account with the given login, secret, and role
    pub async fn create_account(&self, login: &str, secret: &str, role: AccountRole) -> Account {
        let hashed = PasswordHasher::new()
            .hash_secret(secret)
            .expect("Failed to hash secret");
        let account = Account::new(login, role, hashed);
        self.accounts
            .insert_account(account.clone())
            .await
            .expect("Failed to insert account");
        account
    }

    /// Grant a permission, scoped to `units` (unscoped when empty)
    pub async fn grant(&self, account: &Account, permission: &str, units: &[i64]) {
        let permission = self
            .accounts
            .insert_permission(permission)
            .await
            .expect("Failed to insert permission");
        let grant = self
            .accounts
            .grant(account.id, permission.id)
            .await
            .expect("Failed to grant permission");
        for unit in units {
            self.accounts
                .add_scope(grant.id, UnitId(*unit))
                .await
                .expect("Failed to add scope");
        }
    }

    /// Log in and return `(access_token, refresh_token)`
    pub async fn login(&self, login: &str, secret: &str) -> (String, String) {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "login": login, "secret": secret })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        let data = &response.body["data"];
        (
            data["access_token"].as_str().expect("access_token").to_string(),
            data["refresh_token"].as_str().expect("refresh_token").to_string(),
        )
    }

    /// Access token for `account` that expired two minutes ago
    pub fn expired_token(&self, account: &Account) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account.id,
            role: account.role,
            iat: now - 1_000,
            exp: now - 120,
        };
        self.codec.encode(&claims).expect("Failed to encode claims")
    }

    /// Fresh access token for `account` without going through login
    pub fn token_for(&self, account: &Account) -> String {
        self.codec
            .issue(account.id, account.role, chrono::Duration::minutes(5))
            .expect("Failed to issue token")
            .token
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_with_headers(method, path, body, token, &[]).await
    }

    /// Make an HTTP request with extra headers
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(b) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&b).expect("Failed to serialize body"))
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
