//! Wolf kills: the pack's nightly group kill and the younger brother's
//! one-time extra kill.
use crate::action::kinds::target_of;
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, DeathCause, ExecuteError, RoleAction,
    RoleActionDefinition, RoleActionInstance, ValidationError, real_target, validate_defaults,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const WOLF_KILL_OWNERS: &[Role] = &[
    Role::Werewolf,
    Role::WolfKing,
    Role::WolfBrother,
    Role::WolfYoungerBrother,
    Role::Nightmare,
];

const WEREWOLF_KILL: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::WerewolfKill,
    NightConfig::WEREWOLF_PRIORITY,
    ActionTiming::Night,
)
.owned_by(WOLF_KILL_OWNERS);

const EXTRA_KILL: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::WolfYoungerBrotherExtraKill,
    NightConfig::WOLF_EXTRA_KILL_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::WolfYoungerBrother])
.usage_limit(1)
.mandatory()
.multiple_per_phase();

fn kill_targets(session: &Session, alive: &[PlayerId]) -> Vec<PlayerId> {
    if session.settings.allow_wolf_self_kill {
        return alive.to_vec();
    }
    alive
        .iter()
        .copied()
        .filter(|id| !session.is_wolf(*id))
        .collect()
}

fn reject_wolf_target(session: &Session, targets: &[PlayerId]) -> Result<(), ValidationError> {
    match real_target(targets) {
        Some(target) if !session.settings.allow_wolf_self_kill && session.is_wolf(target) => {
            Err(ValidationError::Rule("wolves cannot kill a wolf"))
        }
        _ => Ok(()),
    }
}

/// Whether the nightmare's fear landed on a wolf tonight.
fn pack_is_feared(session: &Session) -> bool {
    session
        .night
        .fear_targets
        .get(&session.day)
        .is_some_and(|feared| session.is_wolf(*feared))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WerewolfKill;

impl RoleAction for WerewolfKill {
    fn definition(&self) -> &RoleActionDefinition {
        &WEREWOLF_KILL
    }

    fn eligible_targets(
        &self,
        session: &Session,
        _actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        kill_targets(session, alive)
    }

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(&WEREWOLF_KILL, session, actor, targets)?;
        reject_wolf_target(session, targets)
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        if pack_is_feared(session) {
            accumulated.metadata.kill_blocked = true;
            return Ok(accumulated);
        }
        accumulated.add_death(DeathCause::Werewolf, target);
        accumulated.metadata.wolf_kills.push(target);
        Ok(accumulated)
    }
}

/// Available only on the night right after the elder wolf brother died.
#[derive(Debug, Clone, Copy, Default)]
pub struct WolfExtraKill;

impl RoleAction for WolfExtraKill {
    fn definition(&self) -> &RoleActionDefinition {
        &EXTRA_KILL
    }

    fn eligible_targets(
        &self,
        session: &Session,
        _actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        kill_targets(session, alive)
    }

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(&EXTRA_KILL, session, actor, targets)?;
        reject_wolf_target(session, targets)
    }

    fn is_available(&self, session: &Session, _actor: PlayerId) -> bool {
        session
            .night
            .wolf_brother_died_day
            .is_some_and(|died| died + 1 == session.day)
    }

    fn execute(
        &self,
        _session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        accumulated.add_death(DeathCause::Werewolf, target);
        accumulated.metadata.wolf_kills.push(target);
        Ok(accumulated)
    }
}
