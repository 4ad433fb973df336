//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the session store, the submission pipeline and
//! spawned night tasks so clients can bubble them up with consistent context.
use thiserror::Error;
use werewolf_core::{GameError, GuildId, SubmitError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no session for guild {0}")]
    SessionNotFound(GuildId),

    #[error("guild {0} already has a session")]
    SessionExists(GuildId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A refused submission or vote; the session is unchanged.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("night task join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl RuntimeError {
    /// Machine-checkable reason for refused submissions.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::SessionExists(_) => "session_exists",
            Self::Repository(_) => "repository",
            Self::Submit(inner) => inner.reason(),
            Self::WorkerJoin(_) => "worker_join",
        }
    }
}
