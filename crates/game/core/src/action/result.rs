//! Accumulated outcome threaded through night resolution.
use std::collections::{BTreeMap, BTreeSet};

use crate::state::{Day, PlayerId};

/// Why a player died. Declaration order is also precedence: when a player ends
/// up under several causes, the earliest one is kept.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeathCause {
    Werewolf,
    DoubleProtection,
    Poison,
    HunterRevenge,
    WolfKingRevenge,
    Reflect,
    DreamWeaver,
    TradedWithWolf,
    Expel,
    Unknown,
}

impl DeathCause {
    /// Causes a ghost rider is immune to.
    pub const fn is_night_damage(self) -> bool {
        matches!(
            self,
            DeathCause::Werewolf
                | DeathCause::Poison
                | DeathCause::HunterRevenge
                | DeathCause::WolfKingRevenge
                | DeathCause::DreamWeaver
        )
    }
}

/// A seer-style check delivered to `actor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckResult {
    pub actor: PlayerId,
    pub target: PlayerId,
    pub is_wolf: bool,
}

/// Side information gathered while folding actions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionMetadata {
    pub checks: Vec<CheckResult>,
    /// Caster who suffered a ghost-rider reflection.
    pub reflected: Option<PlayerId>,
    /// Pair exchanged by the magician tonight.
    pub swap: Option<(PlayerId, PlayerId)>,
    /// The wolf kill was cancelled (e.g. a feared wolf).
    pub kill_blocked: bool,
    /// Targets hit by wolf kills tonight, one entry per kill.
    pub wolf_kills: Vec<PlayerId>,
}

/// Deaths, saves and protections accumulated so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionExecutionResult {
    pub deaths: BTreeMap<DeathCause, BTreeSet<PlayerId>>,
    pub saved: BTreeSet<PlayerId>,
    pub protected: BTreeSet<PlayerId>,
    pub metadata: ResolutionMetadata,
}

impl ActionExecutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_death(mut self, cause: DeathCause, id: PlayerId) -> Self {
        self.add_death(cause, id);
        self
    }

    #[must_use]
    pub fn with_saved(mut self, id: PlayerId) -> Self {
        self.saved.insert(id);
        self
    }

    #[must_use]
    pub fn with_protected(mut self, id: PlayerId) -> Self {
        self.protected.insert(id);
        self
    }

    pub fn add_death(&mut self, cause: DeathCause, id: PlayerId) {
        self.deaths.entry(cause).or_default().insert(id);
    }

    pub fn dies_by(&self, cause: DeathCause, id: PlayerId) -> bool {
        self.deaths.get(&cause).is_some_and(|ids| ids.contains(&id))
    }

    pub fn is_dying(&self, id: PlayerId) -> bool {
        self.deaths.values().any(|ids| ids.contains(&id))
    }

    pub fn remove_everywhere(&mut self, id: PlayerId) {
        for ids in self.deaths.values_mut() {
            ids.remove(&id);
        }
    }

    pub fn prune_empty(&mut self) {
        self.deaths.retain(|_, ids| !ids.is_empty());
    }

    /// Keeps each player under its highest-precedence cause only.
    pub fn dedupe_causes(&mut self) {
        let mut seen = BTreeSet::new();
        for ids in self.deaths.values_mut() {
            ids.retain(|id| seen.insert(*id));
        }
        self.prune_empty();
    }

    /// Folds `other` (e.g. an immediate action's effects) into this result.
    pub fn merge(&mut self, other: ActionExecutionResult) {
        for (cause, ids) in other.deaths {
            self.deaths.entry(cause).or_default().extend(ids);
        }
        self.saved.extend(other.saved);
        self.protected.extend(other.protected);
        self.metadata.checks.extend(other.metadata.checks);
        if self.metadata.reflected.is_none() {
            self.metadata.reflected = other.metadata.reflected;
        }
        if self.metadata.swap.is_none() {
            self.metadata.swap = other.metadata.swap;
        }
        self.metadata.kill_blocked |= other.metadata.kill_blocked;
        self.metadata.wolf_kills.extend(other.metadata.wolf_kills);
    }

    pub fn into_resolution(self, day: Day) -> NightResolution {
        NightResolution {
            day,
            deaths: self
                .deaths
                .into_iter()
                .filter(|(_, ids)| !ids.is_empty())
                .map(|(cause, ids)| (cause, ids.into_iter().collect()))
                .collect(),
            saved: self.saved.into_iter().collect(),
            reflected: self.metadata.reflected,
        }
    }
}

/// Final output of a night: who dies and why, and who was saved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NightResolution {
    pub day: Day,
    pub deaths: BTreeMap<DeathCause, Vec<PlayerId>>,
    pub saved: Vec<PlayerId>,
    pub reflected: Option<PlayerId>,
}

impl NightResolution {
    pub fn dead_players(&self) -> BTreeSet<PlayerId> {
        self.deaths.values().flatten().copied().collect()
    }

    pub fn is_peaceful(&self) -> bool {
        self.deaths.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_highest_precedence_cause() {
        let mut result = ActionExecutionResult::new()
            .with_death(DeathCause::Poison, 3)
            .with_death(DeathCause::Werewolf, 3)
            .with_death(DeathCause::Poison, 4);

        result.dedupe_causes();

        assert!(result.dies_by(DeathCause::Werewolf, 3));
        assert!(!result.dies_by(DeathCause::Poison, 3));
        assert!(result.dies_by(DeathCause::Poison, 4));
    }

    #[test]
    fn resolution_drops_empty_buckets() {
        let mut result = ActionExecutionResult::new().with_death(DeathCause::Werewolf, 1);
        result.remove_everywhere(1);

        let resolution = result.into_resolution(2);
        assert!(resolution.deaths.is_empty());
        assert!(resolution.is_peaceful());
    }
}
