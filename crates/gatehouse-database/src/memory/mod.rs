//! Process-local repository implementations.
//!
//! Used by the `memory` database provider and by tests. Account data is
//! seeded through the administrative mutators on
//! [`MemoryAccountRepository`]; the gate itself only reads.

pub mod account;
pub mod refresh_token;

pub use account::MemoryAccountRepository;
pub use refresh_token::MemoryRefreshTokenRepository;
