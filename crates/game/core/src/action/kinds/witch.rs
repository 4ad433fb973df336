//! Witch potions: the antidote saves tonight's wolf victim, poison kills.
//! Poison is shared with the merchant-gifted variant.
use crate::action::kinds::target_of;
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, DeathCause, ExecuteError, RoleAction,
    RoleActionDefinition, RoleActionInstance, ValidationError, real_target, validate_defaults,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const WITCH_ANTIDOTE: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::WitchAntidote,
    NightConfig::WITCH_ANTIDOTE_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::Witch])
.usage_limit(1)
.allow_dead_target();

const WITCH_POISON: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::WitchPoison,
    NightConfig::WITCH_POISON_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::Witch])
.usage_limit(1)
.reflectable();

const MERCHANT_POISON: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::MerchantPoison,
    NightConfig::MERCHANT_POISON_PRIORITY,
    ActionTiming::Night,
)
.usage_limit(1)
.reflectable();

#[derive(Debug, Clone, Copy, Default)]
pub struct Antidote;

impl Antidote {
    /// Tonight's wolf target as decided so far.
    fn wolf_target(session: &Session, accumulated: &ActionExecutionResult) -> Vec<PlayerId> {
        match accumulated.deaths.get(&DeathCause::Werewolf) {
            Some(victims) if !victims.is_empty() => victims.iter().copied().collect(),
            _ => session
                .night
                .decided_target(ActionId::WerewolfKill)
                .into_iter()
                .collect(),
        }
    }
}

impl RoleAction for Antidote {
    fn definition(&self) -> &RoleActionDefinition {
        &WITCH_ANTIDOTE
    }

    fn eligible_targets(
        &self,
        session: &Session,
        actor: PlayerId,
        _alive: &[PlayerId],
        accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        let self_save = session.settings.witch_can_save_self.allows(session.day);
        Self::wolf_target(session, accumulated)
            .into_iter()
            .filter(|id| self_save || *id != actor)
            .collect()
    }

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(&WITCH_ANTIDOTE, session, actor, targets)?;
        let Some(target) = real_target(targets) else {
            return Ok(());
        };
        if target == actor && !session.settings.witch_can_save_self.allows(session.day) {
            return Err(ValidationError::Rule("self-save is not allowed tonight"));
        }
        if session.night.decided_target(ActionId::WerewolfKill) != Some(target) {
            return Err(ValidationError::Rule(
                "the antidote only works on tonight's wolf victim",
            ));
        }
        Ok(())
    }

    fn execute(
        &self,
        _session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        if accumulated.dies_by(DeathCause::Werewolf, target) {
            accumulated.saved.insert(target);
        }
        Ok(accumulated)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Poison {
    def: &'static RoleActionDefinition,
}

impl Poison {
    pub const fn witch() -> Self {
        Self { def: &WITCH_POISON }
    }

    pub const fn merchant() -> Self {
        Self {
            def: &MERCHANT_POISON,
        }
    }
}

impl RoleAction for Poison {
    fn definition(&self) -> &RoleActionDefinition {
        self.def
    }

    fn execute(
        &self,
        _session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        accumulated.add_death(DeathCause::Poison, target);
        Ok(accumulated)
    }
}
