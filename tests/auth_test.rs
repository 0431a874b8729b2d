//! Integration tests for the login, refresh, and logout flows.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use gatehouse_entity::account::AccountRole;

#[tokio::test]
async fn test_login_success() {
    let app = helpers::TestApp::new();
    app.create_account("alice", "correct horse", AccountRole::User)
        .await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "login": "alice", "secret": "correct horse" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert_eq!(data["token_type"], "Bearer");
    assert_eq!(data["account"]["login"], "alice");
    assert_eq!(data["account"]["role"], "user");
    assert!(data["account"].get("hashed_secret").is_none());
}

#[tokio::test]
async fn test_login_wrong_secret_and_unknown_login_look_alike() {
    let app = helpers::TestApp::new();
    app.create_account("bob", "right", AccountRole::User).await;

    let wrong = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "login": "bob", "secret": "wrong" })),
            None,
        )
        .await;
    let unknown = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "login": "nobody", "secret": "wrong" })),
            None,
        )
        .await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body, unknown.body);
}

#[tokio::test]
async fn test_login_validation_lists_fields() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "login": "", "secret": "" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = response.body["errors"].as_array().expect("errors list");
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(fields, vec!["login", "secret"]);
}

#[tokio::test]
async fn test_login_malformed_body() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "user": "alice" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn test_refresh_rotates_and_old_token_is_rejected() {
    let app = helpers::TestApp::new();
    app.create_account("carol", "pw", AccountRole::User).await;
    let (_, refresh_token) = app.login("carol", "pw").await;

    let first = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let rotated = first.body["data"]["refresh_token"]
        .as_str()
        .expect("rotated refresh token");
    assert_ne!(rotated, refresh_token);

    let reuse = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(reuse.status, StatusCode::UNAUTHORIZED);

    let next = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": rotated })),
            None,
        )
        .await;
    assert_eq!(next.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_issues_current_role() {
    let app = helpers::TestApp::new();
    let mut account = app.create_account("dave", "pw", AccountRole::User).await;
    let (_, refresh_token) = app.login("dave", "pw").await;

    account.role = AccountRole::Manager;
    app.accounts
        .update_account(account)
        .await
        .expect("update account");

    let refreshed = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let access = refreshed.body["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();

    let me = app.request("GET", "/api/auth/me", None, Some(&access)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["token_role"], "manager");
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = helpers::TestApp::new();
    app.create_account("erin", "pw", AccountRole::User).await;
    let (_, refresh_token) = app.login("erin", "pw").await;

    let logout = app
        .request(
            "POST",
            "/api/auth/logout",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(logout.status, StatusCode::OK);

    let again = app
        .request(
            "POST",
            "/api/auth/logout",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);

    let refresh = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unverified_account_cannot_log_in() {
    let app = helpers::TestApp::new();
    let account = gatehouse_entity::account::Account::new(
        "frank",
        AccountRole::User,
        gatehouse_auth::PasswordHasher::new()
            .hash_secret("pw")
            .expect("hash"),
    )
    .unverified();
    app.accounts
        .insert_account(account)
        .await
        .expect("insert account");

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "login": "frank", "secret": "pw" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
