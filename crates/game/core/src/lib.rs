//! Deterministic night rules for a werewolf game.
//!
//! `werewolf-core` defines the canonical rules (actions, registry, executor,
//! group votes, night engine) as pure, synchronous APIs over a [`Session`]
//! document. All night mutation flows through [`engine::NightEngine`]; the
//! runtime crate adds locking, timing and persistence on top.
pub mod action;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod executor;
pub mod registry;
pub mod role;
pub mod state;
pub mod vote;

pub use action::{
    ActionExecutionResult, ActionId, ActionStatus, ActionTiming, CheckResult, DeathCause,
    ExecuteError, NightResolution, RoleAction, RoleActionDefinition, RoleActionInstance,
    SubmissionSource, ValidationError,
};
pub use config::{GameSettings, NightConfig, SKIP_TARGET_ID, WitchSelfSave};
pub use engine::{
    DeathRecord, NightEngine, NightOutcome, SubmitError, SubmitOutcome, TimeoutOutcome,
};
pub use env::{PcgRng, RngOracle};
pub use error::{ErrorSeverity, GameError};
pub use executor::ActionExecutor;
pub use registry::ActionRegistry;
pub use role::{Camp, Role};
pub use state::{
    ActionStatusEntry, Day, GameStep, GuildId, NightPhase, NightState, NightStatus, Player,
    PlayerId, Session,
};
pub use vote::{GroupActionState, GroupVote, VoteError};
