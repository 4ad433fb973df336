//! Outbound port toward the player-facing UI.
//!
//! The night tasks never talk to a chat platform directly. They call a
//! [`PromptPort`] so the runtime can be driven by a real bot, scripted
//! fixtures, or nothing at all (the logging port).
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use werewolf_core::{ActionId, GuildId, NightPhase, PlayerId, TimeoutOutcome};

/// Player-facing notifications issued by night tasks.
///
/// Delivery is best-effort: a failing UI must not stall the night, so none of
/// these calls return errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromptPort: Send + Sync {
    /// Asks `actor` to pick one of `actions` before `deadline_ms` (epoch ms).
    async fn prompt_actor(
        &self,
        guild_id: GuildId,
        actor: PlayerId,
        phase: NightPhase,
        actions: Vec<ActionId>,
        deadline_ms: u64,
    );

    /// Opens a collective vote for `electorate` over `targets`.
    async fn prompt_group(
        &self,
        guild_id: GuildId,
        action: ActionId,
        electorate: Vec<PlayerId>,
        targets: Vec<PlayerId>,
        deadline_ms: u64,
    );

    /// Tells a feared player that they cannot act tonight.
    async fn notify_cannot_act(&self, guild_id: GuildId, actor: PlayerId);

    async fn notify_timeout(&self, guild_id: GuildId, outcome: TimeoutOutcome);

    /// Closes every prompt still open for `phase`.
    async fn close_prompts(&self, guild_id: GuildId, phase: NightPhase);
}

/// Prompt port that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPromptPort;

#[async_trait]
impl PromptPort for LoggingPromptPort {
    async fn prompt_actor(
        &self,
        guild_id: GuildId,
        actor: PlayerId,
        phase: NightPhase,
        actions: Vec<ActionId>,
        deadline_ms: u64,
    ) {
        info!(target: "runtime::prompts", guild_id, actor, %phase, ?actions, deadline_ms, "prompt actor");
    }

    async fn prompt_group(
        &self,
        guild_id: GuildId,
        action: ActionId,
        electorate: Vec<PlayerId>,
        targets: Vec<PlayerId>,
        deadline_ms: u64,
    ) {
        info!(
            target: "runtime::prompts",
            guild_id,
            %action,
            ?electorate,
            ?targets,
            deadline_ms,
            "prompt group"
        );
    }

    async fn notify_cannot_act(&self, guild_id: GuildId, actor: PlayerId) {
        info!(target: "runtime::prompts", guild_id, actor, "actor cannot act tonight");
    }

    async fn notify_timeout(&self, guild_id: GuildId, outcome: TimeoutOutcome) {
        info!(
            target: "runtime::prompts",
            guild_id,
            actor = outcome.actor,
            action = ?outcome.action_id,
            status = %outcome.status,
            "prompt timed out"
        );
    }

    async fn close_prompts(&self, guild_id: GuildId, phase: NightPhase) {
        debug!(target: "runtime::prompts", guild_id, %phase, "prompts closed");
    }
}

/// One notification forwarded by [`ChannelPromptPort`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prompt {
    Actor {
        guild_id: GuildId,
        actor: PlayerId,
        phase: NightPhase,
        actions: Vec<ActionId>,
        deadline_ms: u64,
    },
    Group {
        guild_id: GuildId,
        action: ActionId,
        electorate: Vec<PlayerId>,
        targets: Vec<PlayerId>,
        deadline_ms: u64,
    },
    CannotAct {
        guild_id: GuildId,
        actor: PlayerId,
    },
    TimedOut {
        guild_id: GuildId,
        outcome: TimeoutOutcome,
    },
    Closed {
        guild_id: GuildId,
        phase: NightPhase,
    },
}

/// Forwards every prompt into an unbounded channel, e.g. to bots.
#[derive(Debug, Clone)]
pub struct ChannelPromptPort {
    tx: mpsc::UnboundedSender<Prompt>,
}

impl ChannelPromptPort {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Prompt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, prompt: Prompt) {
        if self.tx.send(prompt).is_err() {
            debug!(target: "runtime::prompts", "prompt receiver dropped");
        }
    }
}

#[async_trait]
impl PromptPort for ChannelPromptPort {
    async fn prompt_actor(
        &self,
        guild_id: GuildId,
        actor: PlayerId,
        phase: NightPhase,
        actions: Vec<ActionId>,
        deadline_ms: u64,
    ) {
        self.forward(Prompt::Actor {
            guild_id,
            actor,
            phase,
            actions,
            deadline_ms,
        });
    }

    async fn prompt_group(
        &self,
        guild_id: GuildId,
        action: ActionId,
        electorate: Vec<PlayerId>,
        targets: Vec<PlayerId>,
        deadline_ms: u64,
    ) {
        self.forward(Prompt::Group {
            guild_id,
            action,
            electorate,
            targets,
            deadline_ms,
        });
    }

    async fn notify_cannot_act(&self, guild_id: GuildId, actor: PlayerId) {
        self.forward(Prompt::CannotAct { guild_id, actor });
    }

    async fn notify_timeout(&self, guild_id: GuildId, outcome: TimeoutOutcome) {
        self.forward(Prompt::TimedOut { guild_id, outcome });
    }

    async fn close_prompts(&self, guild_id: GuildId, phase: NightPhase) {
        self.forward(Prompt::Closed { guild_id, phase });
    }
}
