//! Submission errors surfaced to players, judges and the runtime.
use thiserror::Error;

use crate::action::{ActionId, ActionTiming, ValidationError};
use crate::error::{ErrorSeverity, GameError};
use crate::state::PlayerId;
use crate::vote::VoteError;

/// Why a submission or vote was refused. No state is changed on error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("unknown action {0}")]
    ActionNotFound(String),

    #[error("{action} ({timing}) cannot be used right now")]
    WrongPhase {
        action: ActionId,
        timing: ActionTiming,
    },

    #[error("player {actor} has already acted this phase")]
    AlreadySubmitted { actor: PlayerId },

    #[error("{action} is not available to player {actor}")]
    NotAvailable { actor: PlayerId, action: ActionId },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Vote(#[from] VoteError),
}

impl SubmitError {
    pub fn unknown(action: impl Into<String>) -> Self {
        Self::ActionNotFound(action.into())
    }
}

impl GameError for SubmitError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActionNotFound(_) => ErrorSeverity::Validation,
            Self::WrongPhase { .. } | Self::AlreadySubmitted { .. } => ErrorSeverity::Recoverable,
            Self::NotAvailable { .. } => ErrorSeverity::Recoverable,
            Self::Invalid(inner) => inner.severity(),
            Self::Vote(inner) => inner.severity(),
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::ActionNotFound(_) => "action_not_found",
            Self::WrongPhase { .. } => "wrong_phase",
            Self::AlreadySubmitted { .. } => "already_submitted",
            Self::NotAvailable { .. } => "not_available",
            Self::Invalid(inner) => inner.reason(),
            Self::Vote(inner) => inner.reason(),
        }
    }
}
