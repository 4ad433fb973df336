//! Guard protection and its merchant-gifted variant.
use crate::action::kinds::{previous_day, target_of};
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, ExecuteError, RoleAction, RoleActionDefinition,
    RoleActionInstance,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const GUARD_PROTECT: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::GuardProtect,
    NightConfig::GUARD_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::Guard]);

const MERCHANT_GUARD_PROTECT: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::MerchantGuardProtect,
    NightConfig::MERCHANT_GUARD_PRIORITY,
    ActionTiming::Night,
)
.usage_limit(1);

/// Adds the target to the protected set.
///
/// The guard's own protection remembers its target and does nothing when the
/// same player is picked two nights running. The gifted variant is single-use
/// and keeps no history.
#[derive(Debug, Clone, Copy)]
pub struct Protect {
    def: &'static RoleActionDefinition,
    tracks_last_target: bool,
}

impl Protect {
    pub const fn guard() -> Self {
        Self {
            def: &GUARD_PROTECT,
            tracks_last_target: true,
        }
    }

    pub const fn merchant() -> Self {
        Self {
            def: &MERCHANT_GUARD_PROTECT,
            tracks_last_target: false,
        }
    }

    fn protected_last_night(&self, session: &Session) -> Option<PlayerId> {
        if !self.tracks_last_target {
            return None;
        }
        match (session.night.last_protected, previous_day(session.day)) {
            (Some((day, target)), Some(last)) if day == last => Some(target),
            _ => None,
        }
    }
}

impl RoleAction for Protect {
    fn definition(&self) -> &RoleActionDefinition {
        self.def
    }

    fn eligible_targets(
        &self,
        session: &Session,
        _actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        let last = self.protected_last_night(session);
        alive
            .iter()
            .copied()
            .filter(|id| Some(*id) != last)
            .collect()
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        if self.protected_last_night(session) == Some(target) {
            return Ok(accumulated);
        }
        accumulated.protected.insert(target);
        if self.tracks_last_target {
            session.night.last_protected = Some((session.day, target));
        }
        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::fixtures::{create_test_instance, create_test_session};

    #[test]
    fn guard_protects_and_remembers_target() {
        let mut session = create_test_session();
        let inst = create_test_instance(5, ActionId::GuardProtect, &[3]);

        let result = Protect::guard()
            .execute(&mut session, &inst, ActionExecutionResult::new())
            .unwrap();

        assert!(result.protected.contains(&3));
        assert_eq!(session.night.last_protected, Some((1, 3)));
    }

    #[test]
    fn repeating_last_nights_target_is_a_no_op() {
        let mut session = create_test_session();
        session.day = 2;
        session.night.last_protected = Some((1, 3));
        let inst = create_test_instance(5, ActionId::GuardProtect, &[3]);

        let result = Protect::guard()
            .execute(&mut session, &inst, ActionExecutionResult::new())
            .unwrap();

        assert!(result.protected.is_empty());
        assert_eq!(session.night.last_protected, Some((1, 3)));
    }

    #[test]
    fn merchant_protection_ignores_guard_history() {
        let mut session = create_test_session();
        session.day = 2;
        session.night.last_protected = Some((1, 3));
        session
            .night
            .gifted_actions
            .entry(8)
            .or_default()
            .insert(ActionId::MerchantGuardProtect);
        let inst = create_test_instance(8, ActionId::MerchantGuardProtect, &[3]);

        let result = Protect::merchant()
            .execute(&mut session, &inst, ActionExecutionResult::new())
            .unwrap();

        assert!(result.protected.contains(&3));
        assert_eq!(session.night.last_protected, Some((1, 3)));
    }
}
