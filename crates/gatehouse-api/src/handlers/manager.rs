//! Manager-only handlers.

use axum::Json;
use chrono::Utc;

use crate::dto::response::{ApiResponse, OverviewResponse};
use crate::extractors::AuthClaims;

/// GET /api/manager/overview
pub async fn overview(claims: AuthClaims) -> Json<ApiResponse<OverviewResponse>> {
    Json(ApiResponse::ok(OverviewResponse {
        account_id: claims.sub,
        generated_at: Utc::now(),
    }))
}
