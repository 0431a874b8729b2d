//! Route definitions.
//!
//! Routes are grouped by access rule and mounted under `/api`. Each group
//! carries its own gate layer, applied with `route_layer` so unmatched paths
//! fall through to the 404 fallback without being charged.

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use gatehouse_auth::{AccessRequirement, AccessRule};
use gatehouse_entity::account::AccountRole;

use crate::handlers;
use crate::middleware::gate::{GateLayerState, enforce};
use crate::middleware::logging::request_logging;
use crate::state::AppState;

/// Permission required to manage a unit's projects.
pub const MANAGE_PROJECTS: &str = "manage-projects";

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(public_auth_routes(&state))
        .merge(session_routes(&state))
        .merge(manager_routes(&state))
        .merge(unit_routes(&state));

    Router::new()
        .nest("/api", api_routes)
        .layer(from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

fn public_auth_routes(state: &AppState) -> Router<AppState> {
    let gate = GateLayerState::new(state.clone(), AccessRule::Public);
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route_layer(from_fn_with_state(gate, enforce))
}

fn session_routes(state: &AppState) -> Router<AppState> {
    let gate = GateLayerState::new(
        state.clone(),
        AccessRule::Authenticated(AccessRequirement::authenticated()),
    );
    Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route_layer(from_fn_with_state(gate, enforce))
}

fn manager_routes(state: &AppState) -> Router<AppState> {
    let gate = GateLayerState::new(
        state.clone(),
        AccessRule::Authenticated(AccessRequirement::role(AccountRole::Manager)),
    );
    Router::new()
        .route("/manager/overview", get(handlers::manager::overview))
        .route_layer(from_fn_with_state(gate, enforce))
}

fn unit_routes(state: &AppState) -> Router<AppState> {
    let gate = GateLayerState::new(
        state.clone(),
        AccessRule::Authenticated(AccessRequirement::permission(MANAGE_PROJECTS)),
    )
    .with_unit_param("unit_id");
    Router::new()
        .route(
            "/units/{unit_id}/projects",
            get(handlers::units::list_projects),
        )
        .route_layer(from_fn_with_state(gate, enforce))
}
