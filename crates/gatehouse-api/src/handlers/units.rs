//! Unit-scoped handlers.

use axum::Json;
use axum::extract::Path;

use gatehouse_core::types::UnitId;

use crate::dto::response::{ApiResponse, UnitProjectsResponse};
use crate::extractors::AuthClaims;

/// GET /api/units/{unit_id}/projects
///
/// The gate has already checked `manage-projects` for this unit. Project
/// storage lives outside this service, so the list is empty here.
pub async fn list_projects(
    Path(unit_id): Path<UnitId>,
    claims: AuthClaims,
) -> Json<ApiResponse<UnitProjectsResponse>> {
    Json(ApiResponse::ok(UnitProjectsResponse {
        unit_id,
        account_id: claims.sub,
        projects: Vec::new(),
    }))
}
