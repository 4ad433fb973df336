//! Dream weaver's link. Picks tonight's sleepwalker; immunity and the
//! linked deaths are settled by death resolution.
use crate::action::kinds::{reject_self, target_of};
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, ExecuteError, RoleAction, RoleActionDefinition,
    RoleActionInstance, ValidationError, validate_defaults,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const DREAM_WEAVER_LINK: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::DreamWeaverLink,
    NightConfig::DREAM_WEAVER_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::DreamWeaver])
.mandatory()
.reflectable();

#[derive(Debug, Clone, Copy, Default)]
pub struct DreamWeaverLink;

impl RoleAction for DreamWeaverLink {
    fn definition(&self) -> &RoleActionDefinition {
        &DREAM_WEAVER_LINK
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

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(&DREAM_WEAVER_LINK, session, actor, targets)?;
        reject_self(actor, targets)
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        session.night.dream_targets.insert(session.day, target);
        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::fixtures::{create_test_instance, create_test_session};
    use crate::config::SKIP_TARGET_ID;

    #[test]
    fn link_records_sleepwalker() {
        let mut session = create_test_session();
        let inst = create_test_instance(9, ActionId::DreamWeaverLink, &[8]);

        DreamWeaverLink
            .execute(&mut session, &inst, ActionExecutionResult::new())
            .unwrap();

        assert_eq!(session.night.dream_targets.get(&1), Some(&8));
    }

    #[test]
    fn link_is_mandatory_and_never_self() {
        let session = create_test_session();
        assert!(DreamWeaverLink.validate(&session, 9, &[SKIP_TARGET_ID]).is_err());
        assert!(DreamWeaverLink.validate(&session, 9, &[9]).is_err());
        assert!(DreamWeaverLink.validate(&session, 9, &[8]).is_ok());
    }
}
