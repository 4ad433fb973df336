//! Night orchestration over a single session.
//!
//! The [`NightEngine`] is the authoritative reducer for a [`Session`]'s night
//! state. It borrows the session mutably for the duration of one locked
//! operation, together with the shared [`ActionRegistry`] and an injected
//! [`RngOracle`]. Every mutation (submissions, votes, phase changes,
//! timeouts, resolution) goes through it.
//!
//! Read-only queries the runtime needs while waiting (availability, phase
//! predicates) are also exposed as free functions over `&Session`.

mod availability;
mod errors;
mod lifecycle;
mod resolve;
mod submit;

pub use availability::{available_actions, eligible_targets, is_action_available};
pub use errors::SubmitError;
pub use lifecycle::{
    has_acted_in, is_phase_complete, phase_actions, phase_actors, should_run, wolf_electorate,
};

use crate::action::{
    ActionExecutionResult, ActionId, ActionStatus, DeathCause, NightResolution,
    RoleActionDefinition,
};
use crate::env::RngOracle;
use crate::registry::ActionRegistry;
use crate::role::Role;
use crate::state::{PlayerId, Session};

/// Result of an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmitOutcome {
    pub actor: PlayerId,
    pub action_id: ActionId,
    pub status: ActionStatus,
    /// Effects of an immediate action (e.g. a seer verdict).
    pub result: Option<ActionExecutionResult>,
}

/// A role lost during death application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeathRecord {
    pub player: PlayerId,
    pub role: Role,
    pub cause: DeathCause,
}

/// What the day-announcement step needs after a night.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NightOutcome {
    pub resolution: NightResolution,
    pub deaths: Vec<DeathRecord>,
    /// Death-trigger actions unlocked by these deaths.
    pub granted: Vec<(PlayerId, ActionId)>,
}

/// How a prompt left open at the deadline was settled.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeoutOutcome {
    pub actor: PlayerId,
    pub action_id: Option<ActionId>,
    pub status: ActionStatus,
    pub targets: Vec<PlayerId>,
}

pub struct NightEngine<'a> {
    session: &'a mut Session,
    registry: &'a ActionRegistry,
    rng: &'a dyn RngOracle,
}

impl<'a> NightEngine<'a> {
    pub fn new(
        session: &'a mut Session,
        registry: &'a ActionRegistry,
        rng: &'a dyn RngOracle,
    ) -> Self {
        Self {
            session,
            registry,
            rng,
        }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn registry(&self) -> &'a ActionRegistry {
        self.registry
    }

    /// See [`is_action_available`].
    pub fn is_action_available(&self, actor: PlayerId, action: ActionId) -> bool {
        is_action_available(self.session, self.registry, actor, action)
    }

    /// See [`available_actions`].
    pub fn available_actions(&self, actor: PlayerId) -> Vec<&'a RoleActionDefinition> {
        available_actions(self.session, self.registry, actor)
    }

    pub fn usage_count(&self, actor: PlayerId, action: ActionId) -> u32 {
        self.session.night.usage_count(actor, action)
    }
}
