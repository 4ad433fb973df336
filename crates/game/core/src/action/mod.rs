//! Action model: identity, timing, targeting rules and effects.
//!
//! Every role ability is a [`RoleAction`]: a static [`RoleActionDefinition`]
//! (priority, timing window, target cardinality, usage limit, flags) plus
//! three behaviours:
//!
//! - `eligible_targets`: which players the actor may pick right now
//! - `validate`: whether a concrete submission is legal
//! - `execute`: fold the instance into the accumulated [`ActionExecutionResult`]
//!
//! # Module Structure
//!
//! - `error`: validation and execution errors
//! - `instance`: the per-actor [`RoleActionInstance`] and its status machine
//! - `result`: the accumulated night outcome and death causes
//! - `kinds`: concrete role actions

mod error;
mod instance;
pub mod kinds;
mod result;

pub use error::{ExecuteError, ValidationError};
pub use instance::{ActionStatus, RoleActionInstance, SubmissionSource};
pub use result::{
    ActionExecutionResult, CheckResult, DeathCause, NightResolution, ResolutionMetadata,
};

use crate::config::SKIP_TARGET_ID;
use crate::role::Role;
use crate::state::{Player, PlayerId, Session};

/// Identifier of every action the engine knows.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ActionId {
    NightmareFear,
    MagicianSwap,
    WerewolfKill,
    WolfYoungerBrotherExtraKill,
    DreamWeaverLink,
    GuardProtect,
    MerchantGuardProtect,
    WitchAntidote,
    WitchPoison,
    MerchantPoison,
    DarkMerchantTradeSeer,
    DarkMerchantTradePoison,
    MiracleMerchantTradeGuard,
    HunterRevenge,
    WolfKingRevenge,
    SeerCheck,
    MerchantSeerCheck,
    DeathResolution,
    GhostRiderReflect,
}

impl ActionId {
    pub const fn is_merchant_trade(self) -> bool {
        matches!(
            self,
            ActionId::DarkMerchantTradeSeer
                | ActionId::DarkMerchantTradePoison
                | ActionId::MiracleMerchantTradeGuard
        )
    }
}

/// When an action may be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionTiming {
    Night,
    Day,
    Anytime,
    /// Only reactively, after the owner's death.
    DeathTrigger,
}

/// Static registry entry for an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleActionDefinition {
    pub id: ActionId,
    /// Roles that own this action. Empty for gifted or system actions.
    pub owners: &'static [Role],
    /// Lower resolves earlier.
    pub priority: i32,
    pub timing: ActionTiming,
    pub target_count: usize,
    /// `-1` means unlimited.
    pub usage_limit: i32,
    pub requires_alive_target: bool,
    /// Resolved at submission instead of at night resolution.
    pub is_immediate: bool,
    pub is_optional: bool,
    pub allow_multiple_per_phase: bool,
    /// Harmful or informational: bounced back by a ghost rider.
    pub reflectable: bool,
}

impl RoleActionDefinition {
    pub const fn new(id: ActionId, priority: i32, timing: ActionTiming) -> Self {
        Self {
            id,
            owners: &[],
            priority,
            timing,
            target_count: 1,
            usage_limit: -1,
            requires_alive_target: true,
            is_immediate: false,
            is_optional: true,
            allow_multiple_per_phase: false,
            reflectable: false,
        }
    }

    #[must_use]
    pub const fn owned_by(mut self, owners: &'static [Role]) -> Self {
        self.owners = owners;
        self
    }

    #[must_use]
    pub const fn targets(mut self, count: usize) -> Self {
        self.target_count = count;
        self
    }

    #[must_use]
    pub const fn usage_limit(mut self, limit: i32) -> Self {
        self.usage_limit = limit;
        self
    }

    #[must_use]
    pub const fn allow_dead_target(mut self) -> Self {
        self.requires_alive_target = false;
        self
    }

    #[must_use]
    pub const fn immediate(mut self) -> Self {
        self.is_immediate = true;
        self
    }

    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.is_optional = false;
        self
    }

    #[must_use]
    pub const fn multiple_per_phase(mut self) -> Self {
        self.allow_multiple_per_phase = true;
        self
    }

    #[must_use]
    pub const fn reflectable(mut self) -> Self {
        self.reflectable = true;
        self
    }

    /// Usage limit as a count, `None` when unlimited.
    pub const fn limit(&self) -> Option<u32> {
        if self.usage_limit < 0 {
            None
        } else {
            Some(self.usage_limit as u32)
        }
    }

    pub fn is_owned_by(&self, role: Role) -> bool {
        self.owners.contains(&role)
    }
}

/// Contract every role action implements.
///
/// Implementations must be stateless: all per-game state lives on the
/// [`Session`], which keeps the registry shareable without locking.
pub trait RoleAction: Send + Sync {
    fn definition(&self) -> &RoleActionDefinition;

    fn id(&self) -> ActionId {
        self.definition().id
    }

    /// Players `actor` may target. Defaults to every alive player.
    fn eligible_targets(
        &self,
        _session: &Session,
        _actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        alive.to_vec()
    }

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(self.definition(), session, actor, targets)
    }

    /// Action-specific availability on top of the generic checks.
    fn is_available(&self, _session: &Session, _actor: PlayerId) -> bool {
        true
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError>;
}

pub fn is_skip(targets: &[PlayerId]) -> bool {
    targets.contains(&SKIP_TARGET_ID)
}

/// First real target of a validated submission; `None` for a skip.
pub fn real_target(targets: &[PlayerId]) -> Option<PlayerId> {
    if is_skip(targets) {
        None
    } else {
        targets.first().copied()
    }
}

/// Whether `player` owns `def` through a role or a gift.
///
/// Death-trigger actions belong to roles that are already dead, so any held
/// role counts for them; everything else needs a living role.
pub fn owns_action(def: &RoleActionDefinition, session: &Session, player: &Player) -> bool {
    if session.night.owns_gift(player.id, def.id) {
        return true;
    }
    if def.timing == ActionTiming::DeathTrigger {
        player.roles.iter().any(|role| def.is_owned_by(*role))
    } else {
        player.living_roles().iter().any(|role| def.is_owned_by(*role))
    }
}

/// Generic validation shared by all actions.
///
/// Checks, in order: actor exists, actor alive (death triggers excepted),
/// actor owns the action, usage left, then either an allowed skip or the
/// target count and each target's existence/liveness.
pub fn validate_defaults(
    def: &RoleActionDefinition,
    session: &Session,
    actor: PlayerId,
    targets: &[PlayerId],
) -> Result<(), ValidationError> {
    let player = session
        .player(actor)
        .ok_or(ValidationError::ActorNotFound(actor))?;

    if def.timing != ActionTiming::DeathTrigger && !player.is_alive() {
        return Err(ValidationError::ActorDead(actor));
    }

    if !owns_action(def, session, player) {
        return Err(ValidationError::NotOwned {
            actor,
            action: def.id,
        });
    }

    if let Some(limit) = def.limit()
        && session.night.usage_count(actor, def.id) >= limit
    {
        return Err(ValidationError::UsageLimitExceeded {
            action: def.id,
            limit,
        });
    }

    if is_skip(targets) {
        return if def.is_optional {
            Ok(())
        } else {
            Err(ValidationError::Rule("this action cannot be skipped"))
        };
    }

    if def.target_count > 0 && targets.len() != def.target_count {
        return Err(ValidationError::InvalidTargetCount {
            expected: def.target_count,
            actual: targets.len(),
        });
    }

    for &target in targets {
        let target_player = session
            .player(target)
            .ok_or(ValidationError::TargetNotFound(target))?;
        if def.requires_alive_target && !target_player.is_alive() {
            return Err(ValidationError::TargetDead(target));
        }
    }

    Ok(())
}
