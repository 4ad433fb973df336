//! Night resolution and death application.
use tracing::{debug, info, warn};

use crate::action::{
    ActionExecutionResult, ActionId, ActionStatus, DeathCause, NightResolution, SubmissionSource,
};
use crate::engine::{DeathRecord, NightEngine, NightOutcome};
use crate::env::seed_context;
use crate::executor::ActionExecutor;
use crate::role::Role;
use crate::state::{GameStep, PlayerId};

impl NightEngine<'_> {
    /// Folds tonight's decided instances into a [`NightResolution`].
    ///
    /// Immediate actions already processed at submission are not run again;
    /// their effects arrive through the carried result. Every executed
    /// instance is archived under the current day and the per-night queue is
    /// cleared.
    pub fn resolve_night(&mut self) -> NightResolution {
        self.heal_group_outcomes();

        let instances: Vec<_> = self
            .session
            .night
            .submitted_actions
            .iter()
            .filter(|inst| inst.status == ActionStatus::Submitted)
            .cloned()
            .collect();
        let swap = self.session.night.active_swap();
        let carried = std::mem::take(&mut self.session.night.carried);

        let executor = ActionExecutor::new(self.registry);
        let result = executor.execute_all(self.session, instances, carried, swap);

        let day = self.session.day;
        let night = &mut self.session.night;
        for mut inst in std::mem::take(&mut night.submitted_actions) {
            if inst.status == ActionStatus::Submitted {
                inst.transition(ActionStatus::Processed);
                night.record_history(day, inst);
            }
        }

        let resolution = result.into_resolution(day);
        night.last_resolution = Some(resolution.clone());
        debug!(
            target: "core::engine",
            guild_id = self.session.guild_id,
            day,
            deaths = resolution.dead_players().len(),
            saved = resolution.saved.len(),
            "night resolved"
        );
        resolution
    }

    /// Resolves the night, applies its deaths and hands over to the day.
    pub fn end_night(&mut self) -> NightOutcome {
        let resolution = self.resolve_night();
        let (deaths, granted) = self.apply_deaths(&resolution);
        self.session.step = GameStep::DeathAnnouncement;
        self.session.night.phase = None;
        info!(
            target: "core::engine",
            guild_id = self.session.guild_id,
            day = self.session.day,
            deaths = deaths.len(),
            "night ended"
        );
        NightOutcome {
            resolution,
            deaths,
            granted,
        }
    }

    /// Applies a result produced outside the night fold, e.g. a revenge shot
    /// fired during the day.
    pub fn apply_result(&mut self, result: ActionExecutionResult) -> NightOutcome {
        let resolution = result.into_resolution(self.session.day);
        let (deaths, granted) = self.apply_deaths(&resolution);
        NightOutcome {
            resolution,
            deaths,
            granted,
        }
    }

    /// Marks every listed player dead once and returns the roles lost, plus
    /// the death-trigger actions those deaths unlock.
    ///
    /// A hunter or wolf king gets its revenge unless poisoned. The death of
    /// the wolf brother is remembered so the younger brother gets an extra
    /// kill the following night.
    pub fn apply_deaths(
        &mut self,
        resolution: &NightResolution,
    ) -> (Vec<DeathRecord>, Vec<(PlayerId, ActionId)>) {
        let day = self.session.day;
        let guild_id = self.session.guild_id;
        let mut deaths = Vec::new();
        let mut granted = Vec::new();

        for (cause, ids) in &resolution.deaths {
            for &id in ids {
                let Some(player) = self.session.player_mut(id) else {
                    warn!(
                        target: "core::engine",
                        guild_id,
                        player = id,
                        "death for an unknown player ignored"
                    );
                    continue;
                };
                let Some(role) = player.mark_dead() else {
                    continue;
                };
                deaths.push(DeathRecord {
                    player: id,
                    role,
                    cause: *cause,
                });

                let night = &mut self.session.night;
                let revenge = match role {
                    Role::Hunter => Some(ActionId::HunterRevenge),
                    Role::WolfKing => Some(ActionId::WolfKingRevenge),
                    _ => None,
                };
                if let Some(action) = revenge
                    && *cause != DeathCause::Poison
                {
                    night.death_trigger_grants.insert(id, action);
                    granted.push((id, action));
                }
                if role == Role::WolfBrother {
                    night.wolf_brother_died_day = Some(day);
                }
            }
        }
        (deaths, granted)
    }

    /// Rebuilds a group outcome whose instance went missing.
    ///
    /// If a group state holds real votes but no decided instance of its
    /// action exists, the outcome is recomputed from the stored votes and
    /// submitted as the system. An outcome that no longer validates, e.g. a
    /// kill on a player who has died since, is dropped.
    fn heal_group_outcomes(&mut self) {
        let actions: Vec<ActionId> = self.session.night.group_states.keys().copied().collect();
        for action in actions {
            let night = &self.session.night;
            let has_votes = night
                .group_states
                .get(&action)
                .is_some_and(|state| state.has_real_votes());
            let has_instance = night.submitted_actions.iter().any(|inst| {
                inst.action_id == Some(action)
                    && matches!(
                        inst.status,
                        ActionStatus::Submitted | ActionStatus::Processed
                    )
            });
            if !has_votes || has_instance {
                continue;
            }

            warn!(
                target: "core::engine",
                guild_id = self.session.guild_id,
                action = %action,
                "group outcome missing at resolution; rebuilding from votes"
            );
            let seed = self.session.next_seed(seed_context::VOTE_TIE_BREAK);
            let Some(mut state) = self.session.night.group_states.remove(&action) else {
                continue;
            };
            let instance = if state.resolved {
                state.to_instance(self.session, self.rng, seed)
            } else {
                state.resolve(self.session, self.rng, seed)
            };
            self.session.night.group_states.insert(action, state);
            let Some(instance) = instance else {
                continue;
            };
            if let Err(error) = self.submit_action(
                action,
                instance.actor,
                instance.targets,
                SubmissionSource::System,
            ) {
                warn!(
                    target: "core::engine",
                    guild_id = self.session.guild_id,
                    action = %action,
                    %error,
                    "rebuilt group outcome rejected"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::action::{ActionId, ActionStatus, DeathCause, NightResolution, SubmissionSource};
    use crate::engine::{DeathRecord, NightEngine};
    use crate::env::PcgRng;
    use crate::registry::ActionRegistry;
    use crate::role::Role;
    use crate::state::{GameStep, Player, PlayerId, Session};

    fn create_test_session() -> Session {
        Session::new(4, 5).with_players([
            Player::new(1, [Role::Werewolf]),
            Player::new(2, [Role::Witch]),
            Player::new(3, [Role::Guard]),
            Player::new(4, [Role::Hunter]),
            Player::new(5, [Role::Seer]),
            Player::new(6, [Role::Villager]),
            Player::new(7, [Role::Seer, Role::Villager]),
            Player::new(8, [Role::WolfBrother]),
        ])
    }

    fn wolves_kill(engine: &mut NightEngine<'_>, target: PlayerId) {
        engine.open_group_vote(ActionId::WerewolfKill);
        engine
            .submit_group_vote(ActionId::WerewolfKill, 1, target)
            .unwrap();
        engine.close_group_vote(ActionId::WerewolfKill).unwrap();
    }

    #[test]
    fn antidote_cancels_the_wolf_kill() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        wolves_kill(&mut engine, 6);
        engine
            .submit_action(ActionId::WitchAntidote, 2, vec![6], SubmissionSource::Player)
            .unwrap();

        let outcome = engine.end_night();

        assert!(outcome.resolution.is_peaceful());
        assert_eq!(outcome.resolution.saved, vec![6]);
        assert!(outcome.deaths.is_empty());
        assert_eq!(session.step, GameStep::DeathAnnouncement);
        assert!(session.night.submitted_actions.is_empty());
        assert_eq!(session.night.last_resolution, Some(outcome.resolution));

        let archived: Vec<_> = session
            .night
            .history(1)
            .iter()
            .map(|inst| (inst.action_id, inst.status))
            .collect();
        assert_eq!(
            archived,
            vec![
                (Some(ActionId::WitchAntidote), ActionStatus::Processed),
                (Some(ActionId::WerewolfKill), ActionStatus::Processed),
            ]
        );
    }

    #[test]
    fn saved_and_protected_victim_dies_of_double_protection() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        wolves_kill(&mut engine, 6);
        engine
            .submit_action(ActionId::GuardProtect, 3, vec![6], SubmissionSource::Player)
            .unwrap();
        engine
            .submit_action(ActionId::WitchAntidote, 2, vec![6], SubmissionSource::Player)
            .unwrap();

        let outcome = engine.end_night();

        assert_eq!(
            outcome.deaths,
            vec![DeathRecord {
                player: 6,
                role: Role::Villager,
                cause: DeathCause::DoubleProtection,
            }]
        );
        assert!(!session.is_alive(6));
    }

    #[test]
    fn bitten_hunter_gets_revenge_and_poisoned_hunter_does_not() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        wolves_kill(&mut engine, 4);

        let outcome = engine.end_night();
        assert_eq!(outcome.granted, vec![(4, ActionId::HunterRevenge)]);

        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine
            .submit_action(ActionId::WitchPoison, 2, vec![4], SubmissionSource::Player)
            .unwrap();

        let outcome = engine.end_night();
        assert_eq!(outcome.deaths[0].cause, DeathCause::Poison);
        assert!(outcome.granted.is_empty());
        assert!(session.night.death_trigger_grants.is_empty());
    }

    #[test]
    fn revenge_by_day_is_applied_through_apply_result() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        wolves_kill(&mut engine, 4);
        engine.end_night();

        let shot = engine
            .submit_action(ActionId::HunterRevenge, 4, vec![1], SubmissionSource::Player)
            .unwrap();
        let outcome = engine.apply_result(shot.result.unwrap());

        assert_eq!(outcome.deaths[0].player, 1);
        assert_eq!(outcome.deaths[0].cause, DeathCause::HunterRevenge);
        assert!(!session.is_alive(1));
        assert!(!session.night.death_trigger_grants.contains_key(&4));
    }

    #[test]
    fn dual_role_player_loses_one_role_per_death() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        wolves_kill(&mut engine, 7);

        let outcome = engine.end_night();

        assert_eq!(outcome.deaths[0].role, Role::Seer);
        assert!(session.is_alive(7));
        assert_eq!(session.player(7).unwrap().living_roles(), vec![Role::Villager]);
    }

    #[test]
    fn immediate_check_runs_once_across_the_night() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine
            .submit_action(ActionId::SeerCheck, 5, vec![1], SubmissionSource::Player)
            .unwrap();

        engine.end_night();

        let checks = session
            .night
            .history(1)
            .iter()
            .filter(|inst| inst.action_id == Some(ActionId::SeerCheck))
            .count();
        assert_eq!(checks, 1);
    }

    #[test]
    fn lost_vote_outcome_is_rebuilt_from_votes() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine.open_group_vote(ActionId::WerewolfKill);
        engine
            .submit_group_vote(ActionId::WerewolfKill, 1, 6)
            .unwrap();
        engine
            .submit_group_vote(ActionId::WerewolfKill, 8, 6)
            .unwrap();

        let outcome = engine.end_night();

        assert_eq!(outcome.resolution.deaths[&DeathCause::Werewolf], vec![6]);
    }

    #[test]
    fn rebuilt_outcome_on_a_dead_target_is_dropped() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine.open_group_vote(ActionId::WerewolfKill);
        engine
            .submit_group_vote(ActionId::WerewolfKill, 1, 6)
            .unwrap();
        session.player_mut(6).unwrap().mark_dead();

        let outcome = NightEngine::new(&mut session, &registry, &PcgRng).end_night();

        assert!(outcome.resolution.is_peaceful());
        assert!(
            !session
                .night
                .history(1)
                .iter()
                .any(|inst| inst.action_id == Some(ActionId::WerewolfKill))
        );
        assert_eq!(session.night.usage_count(1, ActionId::WerewolfKill), 0);
    }

    #[test]
    fn wolf_brother_death_is_remembered() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        session.day = 3;
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        let resolution = NightResolution {
            day: 3,
            deaths: [(DeathCause::Poison, vec![8])].into_iter().collect(),
            ..NightResolution::default()
        };

        let (deaths, granted) = engine.apply_deaths(&resolution);

        assert_eq!(deaths.len(), 1);
        assert!(granted.is_empty());
        assert_eq!(session.night.wolf_brother_died_day, Some(3));
    }
}
