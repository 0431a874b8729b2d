//! Refresh token sessions: login, rotation, logout, cleanup.

pub mod cleanup;
pub mod manager;
pub mod store;

pub use cleanup::RefreshTokenCleanup;
pub use manager::{LoginResult, SessionManager, TokenPair};
pub use store::RefreshTokenStore;
