//! Magician's swap. The swapped pair drives tonight's target redirect; the
//! executor applies it, this action only records it.
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, ExecuteError, RoleAction, RoleActionDefinition,
    RoleActionInstance, ValidationError, is_skip, validate_defaults,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const MAGICIAN_SWAP: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::MagicianSwap,
    NightConfig::MAGICIAN_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::Magician])
.targets(2);

#[derive(Debug, Clone, Copy, Default)]
pub struct MagicianSwap;

impl RoleAction for MagicianSwap {
    fn definition(&self) -> &RoleActionDefinition {
        &MAGICIAN_SWAP
    }

    /// Players not swapped yet this game.
    fn eligible_targets(
        &self,
        session: &Session,
        _actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        alive
            .iter()
            .copied()
            .filter(|id| !session.night.swapped_players.contains(id))
            .collect()
    }

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(&MAGICIAN_SWAP, session, actor, targets)?;
        if is_skip(targets) {
            return Ok(());
        }
        if targets[0] == targets[1] {
            return Err(ValidationError::Rule("swap needs two different players"));
        }
        if targets
            .iter()
            .any(|id| session.night.swapped_players.contains(id))
        {
            return Err(ValidationError::Rule("a player can only be swapped once"));
        }
        Ok(())
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let &[a, b] = instance.targets.as_slice() else {
            return Err(ExecuteError::NoTarget {
                action: ActionId::MagicianSwap,
            });
        };
        session.night.swapped_players.extend([a, b]);
        accumulated.metadata.swap = Some((a, b));
        Ok(accumulated)
    }
}
