//! Death-triggered revenge shots (hunter, wolf king).
//!
//! Granted by death application when the owner dies of anything but poison,
//! and consumed on use.
use crate::action::kinds::target_of;
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, DeathCause, ExecuteError, RoleAction,
    RoleActionDefinition, RoleActionInstance,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const HUNTER_REVENGE: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::HunterRevenge,
    NightConfig::REVENGE_PRIORITY,
    ActionTiming::DeathTrigger,
)
.owned_by(&[Role::Hunter])
.usage_limit(1)
.immediate()
.reflectable();

const WOLF_KING_REVENGE: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::WolfKingRevenge,
    NightConfig::REVENGE_PRIORITY,
    ActionTiming::DeathTrigger,
)
.owned_by(&[Role::WolfKing])
.usage_limit(1)
.immediate();

#[derive(Debug, Clone, Copy)]
pub struct Revenge {
    def: &'static RoleActionDefinition,
    cause: DeathCause,
}

impl Revenge {
    pub const fn hunter() -> Self {
        Self {
            def: &HUNTER_REVENGE,
            cause: DeathCause::HunterRevenge,
        }
    }

    pub const fn wolf_king() -> Self {
        Self {
            def: &WOLF_KING_REVENGE,
            cause: DeathCause::WolfKingRevenge,
        }
    }
}

impl RoleAction for Revenge {
    fn definition(&self) -> &RoleActionDefinition {
        self.def
    }

    fn eligible_targets(
        &self,
        _session: &Session,
        actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        alive.iter().copied().filter(|id| *id != actor).collect()
    }

    fn is_available(&self, session: &Session, actor: PlayerId) -> bool {
        session.night.death_trigger_grants.get(&actor) == Some(&self.def.id)
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        accumulated.add_death(self.cause, target);
        session.night.death_trigger_grants.remove(&instance.actor);
        Ok(accumulated)
    }
}
