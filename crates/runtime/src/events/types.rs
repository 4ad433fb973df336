//! Event types for different topics.

use serde::{Deserialize, Serialize};
use werewolf_core::{
    ActionId, Day, GuildId, NightOutcome, NightPhase, PlayerId, SubmitOutcome, TimeoutOutcome,
};

/// Sub-phase boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PhaseEvent {
    PhaseStarted {
        guild_id: GuildId,
        day: Day,
        phase: NightPhase,
        /// Epoch milliseconds.
        ends_at: u64,
    },
    PhaseEnded {
        guild_id: GuildId,
        day: Day,
        phase: NightPhase,
        timed_out: usize,
    },
}

/// Selections, accepted submissions, votes and timeout fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionEvent {
    /// Action chosen, target still open.
    ActionSelected {
        guild_id: GuildId,
        actor: PlayerId,
        action: ActionId,
    },
    ActionSubmitted {
        guild_id: GuildId,
        outcome: SubmitOutcome,
    },
    VoteCast {
        guild_id: GuildId,
        action: ActionId,
        voter: PlayerId,
        target: PlayerId,
    },
    ActionTimedOut {
        guild_id: GuildId,
        outcome: TimeoutOutcome,
    },
}

/// End-of-night results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResolutionEvent {
    NightResolved {
        guild_id: GuildId,
        outcome: NightOutcome,
    },
    /// Deaths caused outside the night fold, e.g. a revenge shot by day.
    DeathsApplied {
        guild_id: GuildId,
        outcome: NightOutcome,
    },
}
