//! Night lifecycle: night start, sub-phase markers, group votes and the
//! timeout fallback.
use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::action::{
    ActionId, ActionStatus, ActionTiming, RoleActionInstance, SubmissionSource,
};
use crate::config::SKIP_TARGET_ID;
use crate::engine::{
    NightEngine, SubmitOutcome, TimeoutOutcome, available_actions, eligible_targets,
    is_action_available,
};
use crate::env::seed_context;
use crate::registry::ActionRegistry;
use crate::state::{GameStep, NightPhase, PlayerId, Session};
use crate::vote::GroupActionState;

/// Alive players who may take part in the collective `action` tonight.
fn electorate(session: &Session, registry: &ActionRegistry, action: ActionId) -> Vec<PlayerId> {
    session
        .players
        .values()
        .filter(|player| player.is_alive())
        .map(|player| player.id)
        .filter(|id| is_action_available(session, registry, *id, action))
        .collect()
}

/// Alive wolves that are not feared tonight.
pub fn wolf_electorate(session: &Session, registry: &ActionRegistry) -> Vec<PlayerId> {
    electorate(session, registry, ActionId::WerewolfKill)
}

/// Night actions `actor` could use in `phase`.
pub fn phase_actions(
    session: &Session,
    registry: &ActionRegistry,
    actor: PlayerId,
    phase: NightPhase,
) -> Vec<ActionId> {
    available_actions(session, registry, actor)
        .into_iter()
        .filter(|def| def.timing == ActionTiming::Night && phase.covers(def.id))
        .map(|def| def.id)
        .collect()
}

/// Players expected to act in `phase`.
pub fn phase_actors(
    session: &Session,
    registry: &ActionRegistry,
    phase: NightPhase,
) -> Vec<PlayerId> {
    if phase == NightPhase::WerewolfVoting {
        return wolf_electorate(session, registry);
    }
    session
        .alive_ids()
        .into_iter()
        .filter(|id| !phase_actions(session, registry, *id, phase).is_empty())
        .collect()
}

/// Whether `phase` has anything to do tonight.
pub fn should_run(session: &Session, registry: &ActionRegistry, phase: NightPhase) -> bool {
    match phase {
        NightPhase::RoleActions => true,
        _ => !phase_actors(session, registry, phase).is_empty(),
    }
}

/// Whether every expected actor of `phase` is done.
pub fn is_phase_complete(session: &Session, registry: &ActionRegistry, phase: NightPhase) -> bool {
    let night = &session.night;
    match phase {
        NightPhase::WerewolfVoting => night
            .group_states
            .get(&ActionId::WerewolfKill)
            .is_none_or(|state| state.resolved || state.all_voted()),
        NightPhase::RoleActions => !night.submitted_actions.iter().any(|inst| {
            matches!(inst.status, ActionStatus::Pending | ActionStatus::Acting)
        }),
        _ => phase_actors(session, registry, phase)
            .into_iter()
            .all(|actor| has_acted_in(session, actor, phase)),
    }
}

/// Whether `actor` already settled an action collected in `phase`.
pub fn has_acted_in(session: &Session, actor: PlayerId, phase: NightPhase) -> bool {
    session.night.instances_for(actor).any(|inst| {
        inst.status.is_terminal() && inst.action_id.is_some_and(|id| phase.covers(id))
    })
}

impl NightEngine<'_> {
    /// Opens the next night.
    ///
    /// Increments the day, clears per-night state and seeds a pending
    /// instance for every alive non-wolf player with a night action.
    pub fn start_night(&mut self) {
        self.session.day += 1;
        self.session.step = GameStep::Night;
        self.session.night.reset_for_night();
        for player in self.session.players.values_mut() {
            player.action_submitted = false;
        }

        let registry = self.registry;
        let pending: Vec<RoleActionInstance> = self
            .session
            .players
            .values()
            .filter(|player| player.is_alive() && !player.is_wolf())
            .filter(|player| {
                available_actions(self.session, registry, player.id)
                    .iter()
                    .any(|def| def.timing == ActionTiming::Night)
            })
            .map(|player| {
                RoleActionInstance::new(player.id, player.primary_role(), SubmissionSource::System)
            })
            .collect();
        self.session.night.submitted_actions = pending;

        debug!(
            target: "core::engine",
            guild_id = self.session.guild_id,
            day = self.session.day,
            pending = self.session.night.submitted_actions.len(),
            "night started"
        );
    }

    /// Sets the phase marker and its window (epoch milliseconds).
    pub fn begin_phase(&mut self, phase: NightPhase, now_ms: u64, window_ms: u64) {
        let night = &mut self.session.night;
        night.phase = Some(phase);
        night.phase_started_at = now_ms;
        night.phase_ends_at = now_ms.saturating_add(window_ms);
    }

    pub fn end_phase(&mut self) {
        self.session.night.phase = None;
    }

    /// Opens a group vote for `action` and returns its electorate.
    pub fn open_group_vote(&mut self, action: ActionId) -> Vec<PlayerId> {
        let members = electorate(self.session, self.registry, action);
        self.session
            .night
            .group_states
            .insert(action, GroupActionState::new(action, members.clone()));
        members
    }

    /// Closes the vote for `action` and submits the outcome as the system.
    ///
    /// Returns `None` when everybody skipped or the outcome was rejected.
    pub fn close_group_vote(&mut self, action: ActionId) -> Option<SubmitOutcome> {
        let seed = self.session.next_seed(seed_context::VOTE_TIE_BREAK);
        let mut state = self.session.night.group_states.remove(&action)?;
        let instance = state.resolve(self.session, self.rng, seed);
        self.session.night.group_states.insert(action, state);

        let instance = instance?;
        match self.submit_action(
            action,
            instance.actor,
            instance.targets,
            SubmissionSource::System,
        ) {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                warn!(
                    target: "core::engine",
                    guild_id = self.session.guild_id,
                    action = %action,
                    %error,
                    "group outcome rejected"
                );
                None
            }
        }
    }

    /// Marks tonight's feared players as done and returns them.
    pub fn skip_feared(&mut self) -> Vec<PlayerId> {
        let day = self.session.day;
        let feared: Vec<PlayerId> = self
            .session
            .alive_ids()
            .into_iter()
            .filter(|id| self.session.night.is_feared(*id, day))
            .collect();
        for actor in &feared {
            if let Some(inst) = self.session.night.open_instance_mut(*actor) {
                inst.targets = vec![SKIP_TARGET_ID];
                inst.transition(ActionStatus::Skipped);
            }
            if let Some(player) = self.session.player_mut(*actor) {
                player.action_submitted = true;
            }
        }
        feared
    }

    /// Settles every prompt of `phase` still open at the deadline.
    ///
    /// A mandatory action with at least one eligible target is submitted by
    /// the system with a uniformly random eligible target. Anything else is
    /// recorded as skipped. An actor who already chose an action is only
    /// answered for with that action.
    pub fn expire_pending(&mut self, phase: NightPhase) -> Vec<TimeoutOutcome> {
        if phase == NightPhase::WerewolfVoting {
            return Vec::new();
        }
        let registry = self.registry;

        let mut candidates: BTreeSet<PlayerId> =
            phase_actors(self.session, registry, phase).into_iter().collect();
        if phase == NightPhase::RoleActions {
            candidates.extend(
                self.session
                    .night
                    .submitted_actions
                    .iter()
                    .filter(|inst| !inst.status.is_terminal())
                    .map(|inst| inst.actor),
            );
        }

        let mut outcomes = Vec::new();
        for actor in candidates {
            if has_acted_in(self.session, actor, phase) {
                continue;
            }
            let mut actions = phase_actions(self.session, registry, actor, phase);
            let chosen = self
                .session
                .night
                .open_instance(actor)
                .filter(|inst| inst.status == ActionStatus::Acting)
                .and_then(|inst| inst.action_id)
                .filter(|id| actions.contains(id));
            if let Some(chosen) = chosen {
                actions = vec![chosen];
            }

            if let Some(outcome) = self.auto_submit(actor, &actions) {
                outcomes.push(outcome);
                continue;
            }
            outcomes.push(self.expire_as_skip(actor, actions.first().copied()));
        }
        outcomes
    }

    /// Random-target fallback for the first mandatory action with targets.
    fn auto_submit(&mut self, actor: PlayerId, actions: &[ActionId]) -> Option<TimeoutOutcome> {
        let registry = self.registry;
        for action in actions {
            let Some(def) = registry.definition(*action) else {
                continue;
            };
            if def.is_optional {
                continue;
            }
            let mut pool = eligible_targets(self.session, registry, actor, *action);
            let mut targets = Vec::new();
            for _ in 0..def.target_count.max(1) {
                let seed = self.session.next_seed(seed_context::TIMEOUT_PICK);
                let Some(index) = self.rng.pick_index(seed, pool.len()) else {
                    break;
                };
                targets.push(pool.remove(index));
            }
            if targets.len() != def.target_count.max(1) {
                continue;
            }

            match self.submit_action(*action, actor, targets.clone(), SubmissionSource::System) {
                Ok(outcome) => {
                    return Some(TimeoutOutcome {
                        actor,
                        action_id: Some(*action),
                        status: outcome.status,
                        targets,
                    });
                }
                Err(error) => warn!(
                    target: "core::engine",
                    guild_id = self.session.guild_id,
                    actor,
                    action = %action,
                    %error,
                    "timeout fallback rejected"
                ),
            }
        }
        None
    }

    fn expire_as_skip(&mut self, actor: PlayerId, action: Option<ActionId>) -> TimeoutOutcome {
        let role = self
            .session
            .player(actor)
            .and_then(|player| player.primary_role());
        let night = &mut self.session.night;

        let action_id = match night.open_instance_mut(actor) {
            Some(inst) => {
                inst.action_id = inst.action_id.or(action);
                inst.targets = vec![SKIP_TARGET_ID];
                inst.transition(ActionStatus::Skipped);
                inst.action_id
            }
            None => {
                if let Some(action) = action {
                    night.submitted_actions.push(RoleActionInstance::decided(
                        actor,
                        role,
                        action,
                        vec![SKIP_TARGET_ID],
                        SubmissionSource::System,
                    ));
                }
                action
            }
        };
        if let Some(player) = self.session.player_mut(actor) {
            player.action_submitted = true;
        }

        TimeoutOutcome {
            actor,
            action_id,
            status: ActionStatus::Skipped,
            targets: vec![SKIP_TARGET_ID],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::PcgRng;
    use crate::role::Role;
    use crate::state::Player;

    fn create_test_session() -> Session {
        Session::new(2, 17).with_players([
            Player::new(1, [Role::Werewolf]),
            Player::new(2, [Role::WolfBrother]),
            Player::new(3, [Role::Seer]),
            Player::new(4, [Role::DreamWeaver]),
            Player::new(5, [Role::Villager]),
            Player::new(6, [Role::Magician]),
            Player::new(7, [Role::Nightmare]),
        ])
    }

    #[test]
    fn start_night_seeds_pending_for_non_wolves_with_actions() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);

        engine.start_night();

        assert_eq!(session.day, 1);
        assert_eq!(session.step, GameStep::Night);
        let actors: Vec<_> = session
            .night
            .submitted_actions
            .iter()
            .map(|inst| (inst.actor, inst.status))
            .collect();
        assert_eq!(
            actors,
            vec![
                (3, ActionStatus::Pending),
                (4, ActionStatus::Pending),
                (6, ActionStatus::Pending),
            ]
        );
    }

    #[test]
    fn phase_predicates_follow_living_roles() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        session.day = 1;
        session.step = GameStep::Night;

        assert!(should_run(&session, &registry, NightPhase::NightmareAction));
        assert!(should_run(&session, &registry, NightPhase::MagicianAction));
        assert!(!should_run(
            &session,
            &registry,
            NightPhase::WolfYoungerBrotherAction
        ));
        assert_eq!(wolf_electorate(&session, &registry), vec![1, 2, 7]);

        session.night.fear_targets.insert(1, 2);
        assert_eq!(wolf_electorate(&session, &registry), vec![1, 7]);

        session.player_mut(6).unwrap().mark_dead();
        assert!(!should_run(&session, &registry, NightPhase::MagicianAction));
    }

    #[test]
    fn mandatory_timeout_picks_an_eligible_target() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine.begin_phase(NightPhase::RoleActions, 0, 1_000);

        let outcomes = engine.expire_pending(NightPhase::RoleActions);

        let weaver = outcomes.iter().find(|o| o.actor == 4).unwrap();
        assert_eq!(weaver.status, ActionStatus::Submitted);
        assert_eq!(weaver.action_id, Some(ActionId::DreamWeaverLink));
        assert_ne!(weaver.targets, vec![4]);
        assert!(session.is_alive(weaver.targets[0]));

        let seer = outcomes.iter().find(|o| o.actor == 3).unwrap();
        assert_eq!(seer.status, ActionStatus::Skipped);

        // The magician's untouched prompt is closed as a plain skip.
        let magician = outcomes.iter().find(|o| o.actor == 6).unwrap();
        assert_eq!(magician.action_id, None);
        assert!(is_phase_complete(&session, &registry, NightPhase::RoleActions));
    }

    #[test]
    fn chosen_action_is_kept_when_the_prompt_expires() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine.begin_phase(NightPhase::RoleActions, 0, 1_000);
        engine.select_action(3, ActionId::SeerCheck).unwrap();
        engine.select_action(4, ActionId::DreamWeaverLink).unwrap();
        assert!(!is_phase_complete(
            engine.session(),
            &registry,
            NightPhase::RoleActions
        ));

        let outcomes = engine.expire_pending(NightPhase::RoleActions);

        let seer = outcomes.iter().find(|o| o.actor == 3).unwrap();
        assert_eq!(seer.status, ActionStatus::Skipped);
        assert_eq!(seer.action_id, Some(ActionId::SeerCheck));

        let weaver = outcomes.iter().find(|o| o.actor == 4).unwrap();
        assert_eq!(weaver.status, ActionStatus::Submitted);
        assert_eq!(weaver.action_id, Some(ActionId::DreamWeaverLink));

        let instances: Vec<_> = session.night.instances_for(4).collect();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].submitted_by, SubmissionSource::System);
        assert!(is_phase_complete(&session, &registry, NightPhase::RoleActions));
    }

    #[test]
    fn role_actions_complete_once_magician_prompt_expires() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();

        engine.begin_phase(NightPhase::MagicianAction, 0, 1_000);
        let magician = engine.expire_pending(NightPhase::MagicianAction);
        assert_eq!(magician.len(), 1);
        assert_eq!(magician[0].action_id, Some(ActionId::MagicianSwap));

        engine.begin_phase(NightPhase::RoleActions, 0, 1_000);
        engine.expire_pending(NightPhase::RoleActions);

        assert!(is_phase_complete(&session, &registry, NightPhase::RoleActions));
    }

    #[test]
    fn solo_phase_completes_when_actor_acts_or_expires() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine.begin_phase(NightPhase::NightmareAction, 0, 1_000);
        assert!(!is_phase_complete(
            engine.session(),
            &registry,
            NightPhase::NightmareAction
        ));

        let outcomes = engine.expire_pending(NightPhase::NightmareAction);
        assert_eq!(outcomes[0].actor, 7);
        assert_eq!(outcomes[0].status, ActionStatus::Skipped);
        assert!(is_phase_complete(
            &session,
            &registry,
            NightPhase::NightmareAction
        ));
    }

    #[test]
    fn closing_a_vote_submits_the_pack_kill() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine.begin_phase(NightPhase::WerewolfVoting, 0, 1_000);

        assert_eq!(engine.open_group_vote(ActionId::WerewolfKill), vec![1, 2, 7]);
        engine.submit_group_vote(ActionId::WerewolfKill, 1, 5).unwrap();
        engine.submit_group_vote(ActionId::WerewolfKill, 2, 5).unwrap();

        let outcome = engine.close_group_vote(ActionId::WerewolfKill).unwrap();

        assert_eq!(outcome.actor, 1);
        assert_eq!(outcome.status, ActionStatus::Submitted);
        assert_eq!(session.night.decided_target(ActionId::WerewolfKill), Some(5));
        assert!(session.night.group_states[&ActionId::WerewolfKill].resolved);
    }

    #[test]
    fn all_skip_vote_kills_nobody() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine.open_group_vote(ActionId::WerewolfKill);

        assert!(engine.close_group_vote(ActionId::WerewolfKill).is_none());
        assert_eq!(session.night.decided_target(ActionId::WerewolfKill), None);
    }

    #[test]
    fn feared_players_are_not_waited_on() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        let mut engine = NightEngine::new(&mut session, &registry, &PcgRng);
        engine.start_night();
        engine
            .submit_action(ActionId::NightmareFear, 7, vec![3], SubmissionSource::Player)
            .unwrap();

        assert_eq!(engine.skip_feared(), vec![3]);
        let seer = engine.session().night.instances_for(3).next().unwrap();
        assert_eq!(seer.status, ActionStatus::Skipped);
    }
}
