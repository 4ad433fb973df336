//! Errors raised while validating or executing a single role action.
use thiserror::Error;

use crate::action::ActionId;
use crate::error::{ErrorSeverity, GameError};
use crate::state::PlayerId;

/// Why a submission failed validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("player {0} does not exist")]
    ActorNotFound(PlayerId),

    #[error("player {0} is dead")]
    ActorDead(PlayerId),

    #[error("player {actor} cannot use {action}")]
    NotOwned { actor: PlayerId, action: ActionId },

    #[error("{action} can only be used {limit} time(s)")]
    UsageLimitExceeded { action: ActionId, limit: u32 },

    #[error("expected {expected} target(s), got {actual}")]
    InvalidTargetCount { expected: usize, actual: usize },

    #[error("target {0} does not exist")]
    TargetNotFound(PlayerId),

    #[error("target {0} is dead")]
    TargetDead(PlayerId),

    #[error("{0}")]
    Rule(&'static str),
}

impl GameError for ValidationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActorNotFound(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::ActorNotFound(_) => "actor_not_found",
            Self::ActorDead(_) => "actor_dead",
            Self::NotOwned { .. } => "not_available",
            Self::UsageLimitExceeded { .. } => "usage_limit_exceeded",
            Self::InvalidTargetCount { .. } => "invalid_target_count",
            Self::TargetNotFound(_) => "target_not_found",
            Self::TargetDead(_) => "target_dead",
            Self::Rule(_) => "rule_violation",
        }
    }
}

/// Failure inside one action's effect. The executor logs it and moves on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecuteError {
    #[error("{action} has no executor registered")]
    MissingExecutor { action: ActionId },

    #[error("instance has no action selected")]
    NoActionSelected,

    #[error("{action} has no target")]
    NoTarget { action: ActionId },

    #[error("{action}: target {target} does not exist")]
    MissingTarget { action: ActionId, target: PlayerId },
}

impl GameError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::MissingExecutor { .. } => "missing_executor",
            Self::NoActionSelected => "no_action_selected",
            Self::NoTarget { .. } => "invalid_target_count",
            Self::MissingTarget { .. } => "target_not_found",
        }
    }
}
