//! Façade over the night engine for one process and many guilds.
//!
//! [`NightService`] owns every collaborator explicitly (coordinator, registry,
//! RNG, prompt port, event bus) and is cheap to clone into tasks. Each call
//! takes the guild lock, runs one engine operation, saves, then publishes and
//! notifies outside the lock.
use std::sync::Arc;

use tracing::{debug, info};
use werewolf_core::{
    ActionId, ActionRegistry, Day, GuildId, NightEngine, NightOutcome, NightStatus, PlayerId,
    RngOracle, RoleActionDefinition, Session, SubmissionSource, SubmitError, SubmitOutcome,
};

use crate::api::{PromptPort, Result};
use crate::config::RuntimeConfig;
use crate::coordinator::SessionCoordinator;
use crate::events::{ActionEvent, Event, EventBus, ResolutionEvent};

#[derive(Clone)]
pub struct NightService {
    coordinator: Arc<SessionCoordinator>,
    registry: Arc<ActionRegistry>,
    rng: Arc<dyn RngOracle>,
    prompts: Arc<dyn PromptPort>,
    events: EventBus,
    config: RuntimeConfig,
}

impl NightService {
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        registry: Arc<ActionRegistry>,
        rng: Arc<dyn RngOracle>,
        prompts: Arc<dyn PromptPort>,
        events: EventBus,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            coordinator,
            registry,
            rng,
            prompts,
            events,
            config,
        }
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn prompts(&self) -> &dyn PromptPort {
        self.prompts.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Runs `body` against a [`NightEngine`] over the locked session.
    pub(crate) async fn with_engine<T, F>(&self, guild_id: GuildId, body: F) -> Result<T>
    where
        F: FnOnce(&mut NightEngine<'_>) -> T + Send,
    {
        let registry = self.registry.as_ref();
        let rng = self.rng.as_ref();
        self.coordinator
            .with_locked_session(guild_id, move |session| {
                let mut engine = NightEngine::new(session, registry, rng);
                body(&mut engine)
            })
            .await
    }

    pub async fn create_session(&self, session: Session) -> Result<()> {
        let guild_id = session.guild_id;
        self.coordinator.insert_session(session).await?;
        info!(target: "runtime::service", guild_id, "session created");
        Ok(())
    }

    pub fn session(&self, guild_id: GuildId) -> Result<Session> {
        self.coordinator.session(guild_id)
    }

    pub fn night_status(&self, guild_id: GuildId) -> Result<NightStatus> {
        Ok(self.session(guild_id)?.night_status())
    }

    /// Submits an action; refusals surface as [`crate::RuntimeError::Submit`].
    ///
    /// An immediate action fired outside the night (a revenge shot during the
    /// day) has its deaths applied right away.
    pub async fn submit_action(
        &self,
        guild_id: GuildId,
        action_id: ActionId,
        actor: PlayerId,
        targets: Vec<PlayerId>,
        source: SubmissionSource,
    ) -> Result<SubmitOutcome> {
        let (outcome, applied) = self
            .with_engine(guild_id, |engine| {
                let outcome = engine.submit_action(action_id, actor, targets, source)?;
                let applied = match &outcome.result {
                    Some(result) if !engine.session().is_night() && !result.deaths.is_empty() => {
                        Some(engine.apply_result(result.clone()))
                    }
                    _ => None,
                };
                Ok::<_, SubmitError>((outcome, applied))
            })
            .await??;

        debug!(
            target: "runtime::service",
            guild_id,
            actor,
            action = %action_id,
            status = %outcome.status,
            "action submitted"
        );
        self.events.publish(Event::Action(ActionEvent::ActionSubmitted {
            guild_id,
            outcome: outcome.clone(),
        }));
        if let Some(applied) = applied {
            self.events
                .publish(Event::Resolution(ResolutionEvent::DeathsApplied {
                    guild_id,
                    outcome: applied,
                }));
        }
        self.coordinator.notify(guild_id);
        Ok(outcome)
    }

    /// Records a player's chosen action ahead of the target.
    pub async fn select_action(
        &self,
        guild_id: GuildId,
        actor: PlayerId,
        action: ActionId,
    ) -> Result<()> {
        self.with_engine(guild_id, |engine| engine.select_action(actor, action))
            .await??;

        debug!(target: "runtime::service", guild_id, actor, %action, "action selected");
        self.events.publish(Event::Action(ActionEvent::ActionSelected {
            guild_id,
            actor,
            action,
        }));
        Ok(())
    }

    pub async fn submit_group_vote(
        &self,
        guild_id: GuildId,
        voter: PlayerId,
        action: ActionId,
        target: PlayerId,
    ) -> Result<()> {
        self.with_engine(guild_id, |engine| {
            engine.submit_group_vote(action, voter, target)
        })
        .await??;

        debug!(target: "runtime::service", guild_id, voter, %action, target, "vote cast");
        self.events.publish(Event::Action(ActionEvent::VoteCast {
            guild_id,
            action,
            voter,
            target,
        }));
        self.coordinator.notify(guild_id);
        Ok(())
    }

    pub fn available_actions(
        &self,
        guild_id: GuildId,
        actor: PlayerId,
    ) -> Result<Vec<RoleActionDefinition>> {
        let session = self.session(guild_id)?;
        Ok(werewolf_core::engine::available_actions(&session, &self.registry, actor)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn is_action_available(
        &self,
        guild_id: GuildId,
        actor: PlayerId,
        action: ActionId,
    ) -> Result<bool> {
        let session = self.session(guild_id)?;
        Ok(werewolf_core::engine::is_action_available(
            &session,
            &self.registry,
            actor,
            action,
        ))
    }

    pub fn usage_count(&self, guild_id: GuildId, actor: PlayerId, action: ActionId) -> Result<u32> {
        Ok(self.session(guild_id)?.night.usage_count(actor, action))
    }

    /// Opens the next night and returns its day number.
    pub async fn start_night(&self, guild_id: GuildId) -> Result<Day> {
        let day = self
            .with_engine(guild_id, |engine| {
                engine.start_night();
                engine.session().day
            })
            .await?;
        info!(target: "runtime::service", guild_id, day, "night started");
        self.coordinator.notify(guild_id);
        Ok(day)
    }

    /// Resolves the night, applies deaths and publishes the outcome.
    pub async fn end_night(&self, guild_id: GuildId) -> Result<NightOutcome> {
        let outcome = self
            .with_engine(guild_id, |engine| engine.end_night())
            .await?;

        info!(
            target: "runtime::service",
            guild_id,
            day = outcome.resolution.day,
            deaths = outcome.deaths.len(),
            saved = outcome.resolution.saved.len(),
            "night resolved"
        );
        self.events
            .publish(Event::Resolution(ResolutionEvent::NightResolved {
                guild_id,
                outcome: outcome.clone(),
            }));
        self.coordinator.notify(guild_id);
        Ok(outcome)
    }
}
