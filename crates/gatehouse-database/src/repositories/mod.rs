//! Collaborator contracts and their PostgreSQL implementations.

pub mod account;
pub mod refresh_token;
pub mod traits;

pub use account::PgAccountRepository;
pub use refresh_token::PgRefreshTokenRepository;
pub use traits::{AccountRepository, RefreshTokenRepository};
