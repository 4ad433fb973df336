//! Priority-ordered night executor.
//!
//! The executor never hard-codes an order: it reads each action's priority
//! from the registry and folds instances through [`RoleAction::execute`].
//! Around every call it applies the two cross-cutting rules of the night:
//!
//! - **Redirect**: a magician swap exchanges two player ids for the night.
//!   Targets are mapped once (A ↔ B), never chained.
//! - **Reflection**: a reflectable action from a good-camp actor aimed at a
//!   living ghost rider hits its caster instead. Once per game.
use tracing::{debug, warn};

use crate::action::{
    ActionExecutionResult, ActionId, DeathCause, ExecuteError, RoleActionInstance,
    SubmissionSource,
};
use crate::config::NightConfig;
use crate::registry::ActionRegistry;
use crate::role::Role;
use crate::state::{PlayerId, Session};

#[derive(Clone, Copy, Debug)]
pub struct ActionExecutor<'r> {
    registry: &'r ActionRegistry,
}

impl<'r> ActionExecutor<'r> {
    pub fn new(registry: &'r ActionRegistry) -> Self {
        Self { registry }
    }

    /// Stable sort by priority; unregistered ids go last.
    pub fn order(&self, instances: &mut [RoleActionInstance]) {
        instances.sort_by_key(|inst| {
            inst.action_id
                .and_then(|id| self.registry.priority(id))
                .unwrap_or(i32::MAX)
        });
    }

    /// Maps targets through tonight's swap, if any.
    pub fn redirect(
        instance: &RoleActionInstance,
        swap: Option<(PlayerId, PlayerId)>,
    ) -> RoleActionInstance {
        let mut redirected = instance.clone();
        let Some((a, b)) = swap else {
            return redirected;
        };
        if matches!(
            instance.action_id,
            Some(ActionId::MagicianSwap | ActionId::DeathResolution)
        ) {
            return redirected;
        }
        for target in &mut redirected.targets {
            if *target == a {
                *target = b;
            } else if *target == b {
                *target = a;
            }
        }
        redirected
    }

    /// Runs one instance with redirect and reflection applied.
    pub fn execute_one(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        accumulated: ActionExecutionResult,
        swap: Option<(PlayerId, PlayerId)>,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let action_id = instance.action_id.ok_or(ExecuteError::NoActionSelected)?;
        let action = self
            .registry
            .get(action_id)
            .ok_or(ExecuteError::MissingExecutor { action: action_id })?;

        let redirected = Self::redirect(instance, swap);

        if action.definition().reflectable
            && let Some(rider) = Self::reflection_target(session, &redirected)
        {
            return Ok(Self::reflect(session, &redirected, rider, accumulated));
        }

        action.execute(session, &redirected, accumulated)
    }

    /// Folds `instances` in priority order, then runs death resolution.
    ///
    /// A failing action is logged and skipped; the fold continues with the
    /// result accumulated so far.
    pub fn execute_all(
        &self,
        session: &mut Session,
        mut instances: Vec<RoleActionInstance>,
        seed: ActionExecutionResult,
        swap: Option<(PlayerId, PlayerId)>,
    ) -> ActionExecutionResult {
        self.order(&mut instances);
        instances.push(RoleActionInstance::decided(
            NightConfig::SYSTEM_ACTOR,
            None,
            ActionId::DeathResolution,
            Vec::new(),
            SubmissionSource::System,
        ));

        let mut accumulated = seed;
        for instance in &instances {
            match self.execute_one(session, instance, accumulated.clone(), swap) {
                Ok(next) => accumulated = next,
                Err(error) => warn!(
                    target: "core::executor",
                    guild_id = session.guild_id,
                    actor = instance.actor,
                    action = ?instance.action_id,
                    %error,
                    "action failed; continuing night resolution"
                ),
            }
        }
        accumulated
    }

    /// The living ghost rider this instance would bounce off, if reflection
    /// is still unspent and the actor is good-camp.
    ///
    /// The camp comes from the role recorded on the instance at submission;
    /// records without one fall back to the actor's current role.
    fn reflection_target(session: &Session, instance: &RoleActionInstance) -> Option<PlayerId> {
        if session.night.ghost_rider_reflected {
            return None;
        }
        let actor_is_good = instance
            .actor_role
            .or_else(|| session.player(instance.actor).and_then(|p| p.primary_role()))
            .is_some_and(|role| role.camp().is_good());
        if !actor_is_good {
            return None;
        }
        instance.targets.iter().copied().find(|target| {
            *target != instance.actor
                && session
                    .player(*target)
                    .is_some_and(|p| p.is_alive() && p.has_living_role(Role::GhostRider))
        })
    }

    fn reflect(
        session: &mut Session,
        instance: &RoleActionInstance,
        rider: PlayerId,
        mut accumulated: ActionExecutionResult,
    ) -> ActionExecutionResult {
        debug!(
            target: "core::executor",
            guild_id = session.guild_id,
            caster = instance.actor,
            rider,
            action = ?instance.action_id,
            "ghost rider reflected action"
        );
        session.night.ghost_rider_reflected = true;
        accumulated.add_death(DeathCause::Reflect, instance.actor);
        accumulated.metadata.reflected = Some(instance.actor);

        let rider_role = session.player(rider).and_then(|p| p.primary_role());
        session.night.record_history(
            session.day,
            RoleActionInstance::decided(
                rider,
                rider_role,
                ActionId::GhostRiderReflect,
                vec![instance.actor],
                SubmissionSource::System,
            ),
        );
        accumulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::fixtures::{create_test_instance, create_test_session};
    use crate::action::{RoleAction, RoleActionDefinition};
    use crate::state::Player;

    fn create_test_registry() -> ActionRegistry {
        ActionRegistry::with_builtin_actions()
    }

    #[test]
    fn order_is_priority_stable_with_unknown_last() {
        let registry = create_test_registry();
        let executor = ActionExecutor::new(&registry);
        let mut instances = vec![
            create_test_instance(7, ActionId::GhostRiderReflect, &[1]),
            create_test_instance(3, ActionId::SeerCheck, &[1]),
            create_test_instance(4, ActionId::WitchPoison, &[2]),
            create_test_instance(1, ActionId::WerewolfKill, &[8]),
            create_test_instance(2, ActionId::WerewolfKill, &[6]),
        ];

        executor.order(&mut instances);

        let order: Vec<_> = instances.iter().map(|i| (i.actor, i.action_id)).collect();
        assert_eq!(
            order,
            vec![
                (1, Some(ActionId::WerewolfKill)),
                (2, Some(ActionId::WerewolfKill)),
                (4, Some(ActionId::WitchPoison)),
                (3, Some(ActionId::SeerCheck)),
                (7, Some(ActionId::GhostRiderReflect)),
            ]
        );
    }

    #[test]
    fn redirect_is_symmetric_and_not_chained() {
        let swap = Some((3, 8));
        let on_a = create_test_instance(1, ActionId::WerewolfKill, &[3]);
        let on_b = create_test_instance(1, ActionId::WerewolfKill, &[8]);
        let elsewhere = create_test_instance(1, ActionId::WerewolfKill, &[5]);

        assert_eq!(ActionExecutor::redirect(&on_a, swap).targets, vec![8]);
        assert_eq!(ActionExecutor::redirect(&on_b, swap).targets, vec![3]);
        assert_eq!(ActionExecutor::redirect(&elsewhere, swap).targets, vec![5]);

        let the_swap = create_test_instance(10, ActionId::MagicianSwap, &[3, 8]);
        assert_eq!(
            ActionExecutor::redirect(&the_swap, swap).targets,
            vec![3, 8]
        );
    }

    #[test]
    fn swapped_kill_lands_on_the_partner() {
        let registry = create_test_registry();
        let executor = ActionExecutor::new(&registry);
        let mut session = create_test_session();

        let result = executor.execute_all(
            &mut session,
            vec![create_test_instance(1, ActionId::WerewolfKill, &[3])],
            ActionExecutionResult::new(),
            Some((3, 8)),
        );

        assert!(result.dies_by(DeathCause::Werewolf, 8));
        assert!(!result.is_dying(3));
    }

    #[test]
    fn reflection_fires_once_per_game() {
        let registry = create_test_registry();
        let executor = ActionExecutor::new(&registry);
        let mut session = create_test_session();

        let result = executor.execute_all(
            &mut session,
            vec![
                create_test_instance(3, ActionId::SeerCheck, &[7]),
                create_test_instance(4, ActionId::WitchPoison, &[7]),
            ],
            ActionExecutionResult::new(),
            None,
        );

        // Poison resolves first (210 < 300) and takes the only reflection.
        assert!(result.dies_by(DeathCause::Reflect, 4));
        assert!(!result.is_dying(3));
        assert_eq!(result.metadata.reflected, Some(4));
        assert_eq!(result.metadata.checks.len(), 1);
        assert!(session.night.ghost_rider_reflected);
        assert_eq!(
            session.night.history(1)[0].action_id,
            Some(ActionId::GhostRiderReflect)
        );
    }

    #[test]
    fn wolves_and_protection_never_reflect() {
        let registry = create_test_registry();
        let executor = ActionExecutor::new(&registry);
        let mut session = create_test_session();

        let result = executor.execute_all(
            &mut session,
            vec![
                create_test_instance(1, ActionId::WerewolfKill, &[7]),
                create_test_instance(5, ActionId::GuardProtect, &[7]),
            ],
            ActionExecutionResult::new(),
            None,
        );

        assert!(!session.night.ghost_rider_reflected);
        assert!(result.deaths.is_empty());
        assert!(result.protected.contains(&7));
    }

    #[test]
    fn reflection_follows_the_role_held_at_submission() {
        let registry = create_test_registry();
        let executor = ActionExecutor::new(&registry);
        let mut session = create_test_session();
        let check = RoleActionInstance::decided(
            3,
            Some(Role::Seer),
            ActionId::SeerCheck,
            vec![7],
            SubmissionSource::Player,
        );
        // Roles traded after the check was submitted.
        session.player_mut(3).unwrap().roles = vec![Role::Werewolf];

        let result = executor.execute_all(
            &mut session,
            vec![check],
            ActionExecutionResult::new(),
            None,
        );

        assert!(result.dies_by(DeathCause::Reflect, 3));
        assert!(session.night.ghost_rider_reflected);
    }

    #[test]
    fn wolf_snapshot_is_not_reflected_after_a_role_change() {
        let registry = create_test_registry();
        let executor = ActionExecutor::new(&registry);
        let mut session = create_test_session();
        // Submitted while the actor still held a wolf role.
        let poison = RoleActionInstance::decided(
            4,
            Some(Role::Nightmare),
            ActionId::WitchPoison,
            vec![7],
            SubmissionSource::Judge,
        );

        let result = executor.execute_all(
            &mut session,
            vec![poison],
            ActionExecutionResult::new(),
            None,
        );

        assert!(!session.night.ghost_rider_reflected);
        assert!(result.dies_by(DeathCause::Poison, 7));
    }

    struct Broken;

    const BROKEN: RoleActionDefinition = RoleActionDefinition::new(
        ActionId::GuardProtect,
        NightConfig::GUARD_PRIORITY,
        crate::action::ActionTiming::Night,
    );

    impl RoleAction for Broken {
        fn definition(&self) -> &RoleActionDefinition {
            &BROKEN
        }

        fn execute(
            &self,
            _session: &mut Session,
            _instance: &RoleActionInstance,
            _accumulated: ActionExecutionResult,
        ) -> Result<ActionExecutionResult, ExecuteError> {
            Err(ExecuteError::NoActionSelected)
        }
    }

    #[test]
    fn failing_action_does_not_stop_the_fold() {
        let mut registry = create_test_registry();
        registry.register(Broken);
        let executor = ActionExecutor::new(&registry);
        let mut session = create_test_session().with_players([Player::new(11, [Role::Villager])]);

        let result = executor.execute_all(
            &mut session,
            vec![
                create_test_instance(5, ActionId::GuardProtect, &[11]),
                create_test_instance(1, ActionId::WerewolfKill, &[11]),
            ],
            ActionExecutionResult::new(),
            None,
        );

        assert!(result.dies_by(DeathCause::Werewolf, 11));
    }
}
