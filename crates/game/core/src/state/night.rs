//! Typed night/action state carried on the session document.
use std::collections::{BTreeMap, BTreeSet};

use crate::action::{
    ActionExecutionResult, ActionId, ActionStatus, NightResolution, RoleActionInstance,
};
use crate::config::{NightConfig, SKIP_TARGET_ID};
use crate::state::{Day, PlayerId};
use crate::vote::{GroupActionState, GroupVote};

/// Ordered sub-phases of a night.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NightPhase {
    NightmareAction,
    MagicianAction,
    WolfYoungerBrotherAction,
    WerewolfVoting,
    RoleActions,
}

impl NightPhase {
    /// Run order of the sub-phases.
    pub const ORDER: [NightPhase; 5] = [
        NightPhase::NightmareAction,
        NightPhase::MagicianAction,
        NightPhase::WolfYoungerBrotherAction,
        NightPhase::WerewolfVoting,
        NightPhase::RoleActions,
    ];

    pub const fn default_window_ms(self) -> u64 {
        match self {
            NightPhase::NightmareAction => NightConfig::NIGHTMARE_WINDOW_MS,
            NightPhase::MagicianAction => NightConfig::MAGICIAN_WINDOW_MS,
            NightPhase::WolfYoungerBrotherAction => NightConfig::WOLF_BROTHER_WINDOW_MS,
            NightPhase::WerewolfVoting => NightConfig::WEREWOLF_VOTING_WINDOW_MS,
            NightPhase::RoleActions => NightConfig::ROLE_ACTIONS_WINDOW_MS,
        }
    }

    /// The action collected exclusively in this sub-phase, if any.
    pub const fn dedicated_action(self) -> Option<ActionId> {
        match self {
            NightPhase::NightmareAction => Some(ActionId::NightmareFear),
            NightPhase::MagicianAction => Some(ActionId::MagicianSwap),
            NightPhase::WolfYoungerBrotherAction => Some(ActionId::WolfYoungerBrotherExtraKill),
            NightPhase::WerewolfVoting => Some(ActionId::WerewolfKill),
            NightPhase::RoleActions => None,
        }
    }

    /// Whether `action` is collected during this sub-phase.
    ///
    /// The general role-actions pool covers everything no dedicated phase owns.
    pub fn covers(self, action: ActionId) -> bool {
        match self.dedicated_action() {
            Some(dedicated) => dedicated == action,
            None => !Self::ORDER
                .iter()
                .any(|phase| phase.dedicated_action() == Some(action)),
        }
    }
}

/// Night and action bookkeeping for one game.
///
/// Per-night fields are reset by [`NightState::reset_for_night`]; the rest
/// (history, usage, grants, once-per-game flags) persists for the whole game.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NightState {
    pub phase: Option<NightPhase>,
    /// Epoch milliseconds.
    pub phase_started_at: u64,
    /// Epoch milliseconds.
    pub phase_ends_at: u64,

    /// Instances created or submitted during the current night.
    pub submitted_actions: Vec<RoleActionInstance>,
    /// Read-only history of executed instances, keyed by day.
    pub executed_actions: BTreeMap<Day, Vec<RoleActionInstance>>,
    pub group_states: BTreeMap<ActionId, GroupActionState>,
    pub usage: BTreeMap<PlayerId, BTreeMap<ActionId, u32>>,
    /// Effects of immediate actions resolved tonight, seeded into the night fold.
    pub carried: ActionExecutionResult,

    /// Last guard-style protection as `(day, target)`.
    pub last_protected: Option<(Day, PlayerId)>,
    pub fear_targets: BTreeMap<Day, PlayerId>,
    pub dream_targets: BTreeMap<Day, PlayerId>,
    /// Players swapped by the magician at some point this game.
    pub swapped_players: BTreeSet<PlayerId>,
    pub death_trigger_grants: BTreeMap<PlayerId, ActionId>,
    pub gifted_actions: BTreeMap<PlayerId, BTreeSet<ActionId>>,
    pub wolf_brother_died_day: Option<Day>,
    pub ghost_rider_reflected: bool,

    pub last_resolution: Option<NightResolution>,
}

impl NightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears everything scoped to a single night.
    pub fn reset_for_night(&mut self) {
        self.phase = None;
        self.phase_started_at = 0;
        self.phase_ends_at = 0;
        self.submitted_actions.clear();
        self.group_states.clear();
        self.carried = ActionExecutionResult::default();
    }

    pub fn instances_for(&self, actor: PlayerId) -> impl Iterator<Item = &RoleActionInstance> {
        self.submitted_actions
            .iter()
            .filter(move |inst| inst.actor == actor)
    }

    /// The actor's single non-terminal instance, if one exists.
    pub fn open_instance(&self, actor: PlayerId) -> Option<&RoleActionInstance> {
        self.instances_for(actor)
            .find(|inst| !inst.status.is_terminal())
    }

    pub fn open_instance_mut(&mut self, actor: PlayerId) -> Option<&mut RoleActionInstance> {
        self.submitted_actions
            .iter_mut()
            .find(|inst| inst.actor == actor && !inst.status.is_terminal())
    }

    pub fn has_terminal_instance(&self, actor: PlayerId) -> bool {
        self.instances_for(actor)
            .any(|inst| inst.status.is_terminal())
    }

    pub fn usage_count(&self, actor: PlayerId, action: ActionId) -> u32 {
        self.usage
            .get(&actor)
            .and_then(|per_action| per_action.get(&action))
            .copied()
            .unwrap_or(0)
    }

    pub fn record_usage(&mut self, actor: PlayerId, action: ActionId) {
        *self
            .usage
            .entry(actor)
            .or_default()
            .entry(action)
            .or_insert(0) += 1;
    }

    /// Gives back one use, e.g. while re-validating an override.
    pub fn release_usage(&mut self, actor: PlayerId, action: ActionId) {
        if let Some(count) = self
            .usage
            .get_mut(&actor)
            .and_then(|per_action| per_action.get_mut(&action))
        {
            *count = count.saturating_sub(1);
        }
    }

    pub fn is_feared(&self, actor: PlayerId, day: Day) -> bool {
        self.fear_targets.get(&day) == Some(&actor)
    }

    pub fn history(&self, day: Day) -> &[RoleActionInstance] {
        self.executed_actions
            .get(&day)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn record_history(&mut self, day: Day, instance: RoleActionInstance) {
        self.executed_actions.entry(day).or_default().push(instance);
    }

    /// First target of the latest decided instance of `action` tonight.
    pub fn decided_target(&self, action: ActionId) -> Option<PlayerId> {
        self.submitted_actions
            .iter()
            .rev()
            .filter(|inst| inst.action_id == Some(action))
            .filter(|inst| {
                matches!(
                    inst.status,
                    ActionStatus::Submitted | ActionStatus::Processed
                )
            })
            .find_map(|inst| inst.first_target())
    }

    /// The pair of players exchanged tonight by a magician swap.
    pub fn active_swap(&self) -> Option<(PlayerId, PlayerId)> {
        swap_pair(&self.submitted_actions)
    }

    pub fn owns_gift(&self, actor: PlayerId, action: ActionId) -> bool {
        self.gifted_actions
            .get(&actor)
            .is_some_and(|gifts| gifts.contains(&action))
    }
}

/// Extracts the swapped pair from a decided magician swap among `instances`.
pub fn swap_pair(instances: &[RoleActionInstance]) -> Option<(PlayerId, PlayerId)> {
    instances
        .iter()
        .filter(|inst| inst.action_id == Some(ActionId::MagicianSwap))
        .filter(|inst| {
            matches!(
                inst.status,
                ActionStatus::Submitted | ActionStatus::Processed
            )
        })
        .find_map(|inst| match inst.targets.as_slice() {
            [a, b] if *a != SKIP_TARGET_ID && *b != SKIP_TARGET_ID && a != b => Some((*a, *b)),
            _ => None,
        })
}

/// Serializable snapshot of the current night for dashboards.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NightStatus {
    pub day: Day,
    pub phase: Option<NightPhase>,
    pub phase_started_at: u64,
    pub phase_ends_at: u64,
    pub votes: BTreeMap<ActionId, Vec<GroupVote>>,
    pub action_statuses: Vec<ActionStatusEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionStatusEntry {
    pub actor: PlayerId,
    pub action_id: Option<ActionId>,
    pub status: ActionStatus,
}
