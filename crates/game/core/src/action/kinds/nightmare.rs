//! Nightmare's fear: the feared player cannot act tonight.
use crate::action::kinds::{previous_day, reject_self, target_of};
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, ExecuteError, RoleAction, RoleActionDefinition,
    RoleActionInstance, ValidationError, real_target, validate_defaults,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const NIGHTMARE_FEAR: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::NightmareFear,
    NightConfig::NIGHTMARE_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::Nightmare])
.immediate();

#[derive(Debug, Clone, Copy, Default)]
pub struct NightmareFear;

impl NightmareFear {
    fn last_target(session: &Session) -> Option<PlayerId> {
        previous_day(session.day).and_then(|day| session.night.fear_targets.get(&day).copied())
    }
}

impl RoleAction for NightmareFear {
    fn definition(&self) -> &RoleActionDefinition {
        &NIGHTMARE_FEAR
    }

    fn eligible_targets(
        &self,
        session: &Session,
        actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        let last = Self::last_target(session);
        alive
            .iter()
            .copied()
            .filter(|id| *id != actor && Some(*id) != last)
            .collect()
    }

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(&NIGHTMARE_FEAR, session, actor, targets)?;
        reject_self(actor, targets)?;
        if real_target(targets).is_some() && real_target(targets) == Self::last_target(session) {
            return Err(ValidationError::Rule(
                "cannot fear the same player two nights in a row",
            ));
        }
        Ok(())
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        session.night.fear_targets.insert(session.day, target);
        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::fixtures::{create_test_instance, create_test_session};
    use crate::state::Player;

    fn create_nightmare_session() -> Session {
        create_test_session().with_players([Player::new(10, [Role::Nightmare])])
    }

    #[test]
    fn fear_is_recorded_for_tonight() {
        let mut session = create_nightmare_session();
        let inst = create_test_instance(10, ActionId::NightmareFear, &[4]);

        NightmareFear
            .execute(&mut session, &inst, ActionExecutionResult::new())
            .unwrap();

        assert!(session.night.is_feared(4, session.day));
    }

    #[test]
    fn cannot_repeat_last_nights_target_or_self() {
        let mut session = create_nightmare_session();
        session.day = 2;
        session.night.fear_targets.insert(1, 4);

        assert!(NightmareFear.validate(&session, 10, &[4]).is_err());
        assert!(NightmareFear.validate(&session, 10, &[10]).is_err());
        assert!(NightmareFear.validate(&session, 10, &[5]).is_ok());

        let eligible = NightmareFear.eligible_targets(
            &session,
            10,
            &session.alive_ids(),
            &ActionExecutionResult::new(),
        );
        assert!(!eligible.contains(&4));
        assert!(!eligible.contains(&10));
    }
}
