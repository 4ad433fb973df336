//! Error types raised by repository implementations.

use thiserror::Error;
use werewolf_core::GuildId;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("session repository lock was poisoned")]
    LockPoisoned,

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted session document for guild {guild_id}: {reason}")]
    CorruptedData { guild_id: GuildId, reason: String },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
