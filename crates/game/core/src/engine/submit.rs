//! Submission pipeline for actions and group votes.
use tracing::warn;

use crate::action::{
    ActionExecutionResult, ActionId, ActionStatus, ActionTiming, RoleActionDefinition,
    RoleActionInstance, SubmissionSource, is_skip,
};
use crate::engine::{NightEngine, SubmitError, SubmitOutcome, eligible_targets};
use crate::executor::ActionExecutor;
use crate::state::{GameStep, PlayerId};
use crate::vote::VoteError;

impl NightEngine<'_> {
    /// Validates and records `actor`'s action.
    ///
    /// Pipeline: known action, timing window, one action per phase (players
    /// only), action validation, availability (players only), upsert of the
    /// actor's instance, immediate execution, usage accounting. Nothing is
    /// changed when an error is returned.
    pub fn submit_action(
        &mut self,
        action_id: ActionId,
        actor: PlayerId,
        targets: Vec<PlayerId>,
        source: SubmissionSource,
    ) -> Result<SubmitOutcome, SubmitError> {
        let registry = self.registry;
        let action = registry
            .get(action_id)
            .ok_or_else(|| SubmitError::unknown(action_id.to_string()))?;
        let def = action.definition();

        self.check_window(def, actor)?;

        if source == SubmissionSource::Player
            && !def.allow_multiple_per_phase
            && self.has_acted_this_phase(actor)
        {
            return Err(SubmitError::AlreadySubmitted { actor });
        }

        // An override of an already-counted instance must not trip the usage limit.
        let refund = source != SubmissionSource::Player
            && self.session.night.instances_for(actor).any(|inst| {
                inst.action_id == Some(action_id) && inst.status == ActionStatus::Submitted
            });
        if refund {
            self.session.night.release_usage(actor, action_id);
        }
        let validated = action.validate(self.session, actor, &targets);
        if refund {
            self.session.night.record_usage(actor, action_id);
        }
        validated?;

        if source == SubmissionSource::Player && !self.is_action_available(actor, action_id) {
            return Err(SubmitError::NotAvailable {
                actor,
                action: action_id,
            });
        }

        let skipped = is_skip(&targets);
        let (index, recount) = self.upsert(action_id, actor, targets, source);
        if !skipped && !recount {
            self.session.night.record_usage(actor, action_id);
        }
        if let Some(player) = self.session.player_mut(actor) {
            player.action_submitted = true;
        }

        let result = if def.is_immediate && !skipped {
            self.run_immediate(index)
        } else {
            None
        };

        let status = self.session.night.submitted_actions[index].status;
        Ok(SubmitOutcome {
            actor,
            action_id,
            status,
            result,
        })
    }

    /// Records `actor`'s choice of action before a target is picked.
    ///
    /// The actor's open instance (or a new one) moves to `Acting` with the
    /// chosen action; choosing again replaces the choice. Targets are
    /// confirmed later through [`NightEngine::submit_action`].
    pub fn select_action(
        &mut self,
        actor: PlayerId,
        action_id: ActionId,
    ) -> Result<(), SubmitError> {
        let registry = self.registry;
        let def = registry
            .definition(action_id)
            .ok_or_else(|| SubmitError::unknown(action_id.to_string()))?;
        self.check_window(def, actor)?;
        if !def.allow_multiple_per_phase && self.has_acted_this_phase(actor) {
            return Err(SubmitError::AlreadySubmitted { actor });
        }
        if !self.is_action_available(actor, action_id) {
            return Err(SubmitError::NotAvailable {
                actor,
                action: action_id,
            });
        }

        let snapshot = self
            .session
            .player(actor)
            .and_then(|player| player.primary_role());
        let instances = &mut self.session.night.submitted_actions;
        let index = match instances
            .iter()
            .position(|inst| inst.actor == actor && !inst.status.is_terminal())
        {
            Some(index) => index,
            None => {
                instances.push(RoleActionInstance::new(
                    actor,
                    snapshot,
                    SubmissionSource::Player,
                ));
                instances.len() - 1
            }
        };
        let inst = &mut instances[index];
        inst.action_id = Some(action_id);
        inst.actor_role = inst.actor_role.or(snapshot);
        inst.submitted_by = SubmissionSource::Player;
        inst.transition(ActionStatus::Acting);
        Ok(())
    }

    /// Records or replaces `voter`'s vote in the open group vote for `action_id`.
    pub fn submit_group_vote(
        &mut self,
        action_id: ActionId,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<(), SubmitError> {
        let eligible = eligible_targets(self.session, self.registry, voter, action_id);
        let state = self
            .session
            .night
            .group_states
            .get_mut(&action_id)
            .ok_or(VoteError::NotOpen(action_id))?;
        state.submit_vote(voter, target, &eligible)?;

        if let Some(player) = self.session.player_mut(voter) {
            player.action_submitted = true;
        }
        Ok(())
    }

    fn check_window(&self, def: &RoleActionDefinition, actor: PlayerId) -> Result<(), SubmitError> {
        let night = &self.session.night;
        let open = match def.timing {
            ActionTiming::Night => {
                self.session.is_night() && night.phase.is_none_or(|phase| phase.covers(def.id))
            }
            ActionTiming::Anytime => true,
            ActionTiming::Day => self.session.step == GameStep::Day,
            ActionTiming::DeathTrigger => night.death_trigger_grants.get(&actor) == Some(&def.id),
        };
        if open {
            Ok(())
        } else {
            Err(SubmitError::WrongPhase {
                action: def.id,
                timing: def.timing,
            })
        }
    }

    /// Whether `actor` already holds a terminal instance in the current phase.
    fn has_acted_this_phase(&self, actor: PlayerId) -> bool {
        let phase = self.session.night.phase;
        self.session.night.instances_for(actor).any(|inst| {
            inst.status.is_terminal()
                && inst
                    .action_id
                    .is_none_or(|id| phase.is_none_or(|phase| phase.covers(id)))
        })
    }

    /// Replaces the actor's open instance, or (for judges and the system) an
    /// already-decided instance of the same action; appends otherwise.
    ///
    /// Returns the instance index and whether the replaced instance had
    /// already been counted as a use of this action.
    fn upsert(
        &mut self,
        action_id: ActionId,
        actor: PlayerId,
        targets: Vec<PlayerId>,
        source: SubmissionSource,
    ) -> (usize, bool) {
        let snapshot = self
            .session
            .player(actor)
            .and_then(|player| player.primary_role());
        let instances = &mut self.session.night.submitted_actions;

        let open = instances
            .iter()
            .position(|inst| inst.actor == actor && !inst.status.is_terminal());
        let replace = open.or_else(|| {
            if source == SubmissionSource::Player {
                return None;
            }
            instances.iter().position(|inst| {
                inst.actor == actor
                    && inst.action_id == Some(action_id)
                    && matches!(inst.status, ActionStatus::Submitted | ActionStatus::Skipped)
            })
        });

        match replace {
            Some(index) => {
                let previous = &instances[index];
                let recount = previous.status == ActionStatus::Submitted
                    && previous.action_id == Some(action_id);
                let role = previous.actor_role.or(snapshot);
                instances[index] =
                    RoleActionInstance::decided(actor, role, action_id, targets, source);
                (index, recount)
            }
            None => {
                instances.push(RoleActionInstance::decided(
                    actor, snapshot, action_id, targets, source,
                ));
                (instances.len() - 1, false)
            }
        }
    }

    /// Executes an immediate action at submission and freezes it.
    ///
    /// The instance is recorded in tonight's history once; its effects are
    /// carried into the night fold when submitted at night.
    fn run_immediate(&mut self, index: usize) -> Option<ActionExecutionResult> {
        let instance = self.session.night.submitted_actions[index].clone();
        let swap = self.session.night.active_swap();
        let executor = ActionExecutor::new(self.registry);

        match executor.execute_one(self.session, &instance, ActionExecutionResult::new(), swap) {
            Ok(result) => {
                let day = self.session.day;
                let at_night = self.session.is_night();
                let night = &mut self.session.night;
                night.submitted_actions[index].transition(ActionStatus::Processed);
                let processed = night.submitted_actions[index].clone();
                night.record_history(day, processed);
                if at_night {
                    night.carried.merge(result.clone());
                }
                Some(result)
            }
            Err(error) => {
                warn!(
                    target: "core::executor",
                    guild_id = self.session.guild_id,
                    actor = instance.actor,
                    action = ?instance.action_id,
                    %error,
                    "immediate action failed"
                );
                None
            }
        }
    }
}
