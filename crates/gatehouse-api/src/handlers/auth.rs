//! Auth handlers: login, refresh, logout, me.

use axum::Json;
use axum::extract::State;

use gatehouse_core::GateError;

use crate::dto::request::{LoginRequest, LogoutRequest, RefreshRequest};
use crate::dto::response::{
    AccountResponse, ApiResponse, LoginResponse, MeResponse, MessageResponse, TokenResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthClaims, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let result = state.session_manager.login(&req.login, &req.secret).await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        account: AccountResponse::from(&result.account),
        tokens: result.tokens.into(),
    })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let tokens = state.session_manager.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(tokens.into())))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LogoutRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.session_manager.logout(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    claims: AuthClaims,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let account = state
        .accounts
        .find_account_by_id(claims.sub)
        .await?
        .ok_or(GateError::AccountNotFound)?;

    Ok(Json(ApiResponse::ok(MeResponse {
        account: AccountResponse::from(&account),
        token_role: claims.role,
        token_expires_at: claims.expires_at(),
    })))
}
