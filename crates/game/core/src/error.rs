//! Shared error vocabulary for werewolf-core.
//!
//! Concrete errors live next to the code that raises them:
//! [`ValidationError`](crate::action::ValidationError) for target checks,
//! [`ExecuteError`](crate::action::ExecuteError) for the executor,
//! [`VoteError`](crate::vote::VoteError) for group votes and
//! [`SubmitError`](crate::engine::SubmitError) for the submission pipeline.
//! All of them implement [`GameError`] so callers can log a severity and hand
//! a stable reason code to players.

/// How a refused request should be treated by its caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// The same request may be accepted later tonight or in another phase
    /// (window closed, already acted).
    Recoverable,

    /// The request itself is wrong: dead target, wrong target count, unknown
    /// action.
    Validation,

    /// The session disagrees with itself, e.g. an instance whose actor is not
    /// seated. Worth a warning in the logs.
    Internal,
}

impl ErrorSeverity {
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Implemented by every error enum in the crate.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable snake_case code clients match on (e.g. `"target_dead"`).
    fn reason(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_displays_as_snake_case() {
        assert_eq!(ErrorSeverity::Recoverable.to_string(), "recoverable");
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(!ErrorSeverity::Validation.is_recoverable());
    }
}
