//! Application state shared across handlers and middleware.

use std::sync::Arc;

use gatehouse_auth::{RequestGate, SessionManager};
use gatehouse_core::config::AppConfig;
use gatehouse_database::AccountRepository;

/// Shared dependencies, passed to handlers via `State<AppState>`.
///
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// The request gate.
    pub gate: Arc<RequestGate>,
    /// Login, refresh, and logout flows.
    pub session_manager: Arc<SessionManager>,
    /// Account lookups for handlers.
    pub accounts: Arc<dyn AccountRepository>,
}
