use crate::action::kinds::target_of;
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, CheckResult, ExecuteError, RoleAction,
    RoleActionDefinition, RoleActionInstance,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const SEER_CHECK: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::SeerCheck,
    NightConfig::SEER_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::Seer])
.immediate()
.reflectable();

const MERCHANT_SEER_CHECK: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::MerchantSeerCheck,
    NightConfig::MERCHANT_SEER_PRIORITY,
    ActionTiming::Night,
)
.usage_limit(1)
.immediate()
.reflectable();

/// Reveals whether the target plays for the wolves.
#[derive(Debug, Clone, Copy)]
pub struct SeerCheck {
    def: &'static RoleActionDefinition,
}

impl SeerCheck {
    pub const fn seer() -> Self {
        Self { def: &SEER_CHECK }
    }

    pub const fn merchant() -> Self {
        Self {
            def: &MERCHANT_SEER_CHECK,
        }
    }

    /// The younger brother reads as good while the elder brother lives.
    pub fn reads_as_wolf(session: &Session, target: PlayerId) -> bool {
        let Some(player) = session.player(target) else {
            return false;
        };
        let elder_alive = session.is_role_alive(Role::WolfBrother);
        player
            .roles
            .iter()
            .filter(|role| !(elder_alive && **role == Role::WolfYoungerBrother))
            .any(|role| role.is_wolf())
    }
}

impl RoleAction for SeerCheck {
    fn definition(&self) -> &RoleActionDefinition {
        self.def
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        if session.player(target).is_none() {
            return Err(ExecuteError::MissingTarget {
                action: self.def.id,
                target,
            });
        }
        accumulated.metadata.checks.push(CheckResult {
            actor: instance.actor,
            target,
            is_wolf: Self::reads_as_wolf(session, target),
        });
        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::fixtures::{create_test_instance, create_test_session};
    use crate::state::Player;

    #[test]
    fn check_reports_camp() {
        let mut session = create_test_session();
        let wolf = create_test_instance(3, ActionId::SeerCheck, &[1]);
        let villager = create_test_instance(3, ActionId::SeerCheck, &[8]);

        let result = SeerCheck::seer()
            .execute(&mut session, &wolf, ActionExecutionResult::new())
            .unwrap();
        let result = SeerCheck::seer()
            .execute(&mut session, &villager, result)
            .unwrap();

        assert_eq!(
            result.metadata.checks,
            vec![
                CheckResult {
                    actor: 3,
                    target: 1,
                    is_wolf: true
                },
                CheckResult {
                    actor: 3,
                    target: 8,
                    is_wolf: false
                },
            ]
        );
    }

    #[test]
    fn younger_brother_hides_behind_living_elder() {
        let mut session =
            create_test_session().with_players([Player::new(10, [Role::WolfYoungerBrother])]);
        assert!(!SeerCheck::reads_as_wolf(&session, 10));

        session.player_mut(2).unwrap().mark_dead();
        assert!(SeerCheck::reads_as_wolf(&session, 10));
    }
}
