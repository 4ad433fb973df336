//! High-level night orchestrator.
//!
//! [`NightRuntime`] wires the coordinator, registry, RNG, prompt port and
//! event bus into a [`NightService`] and drives whole nights through the
//! [`NightSequencer`]. Each guild's night runs on its own task; guilds never
//! wait on each other.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use werewolf_core::{
    ActionRegistry, GameSettings, GuildId, NightOutcome, PcgRng, Player, RngOracle, Session,
};

use crate::api::{LoggingPromptPort, PromptPort, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::coordinator::SessionCoordinator;
use crate::events::{Event, EventBus, Topic};
use crate::repository::{InMemorySessionRepository, SessionRepository};
use crate::sequencer::{NightContext, NightSequencer, NightTask};
use crate::service::NightService;

#[derive(Clone)]
pub struct NightRuntime {
    service: NightService,
    sequencer: Arc<NightSequencer>,
}

impl NightRuntime {
    pub fn builder() -> NightRuntimeBuilder {
        NightRuntimeBuilder::new()
    }

    pub fn service(&self) -> &NightService {
        &self.service
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.service.events().subscribe(topic)
    }

    /// Creates a guild session with a configured or random seed.
    pub async fn create_session(
        &self,
        guild_id: GuildId,
        players: impl IntoIterator<Item = Player>,
        settings: GameSettings,
    ) -> Result<()> {
        let seed = self
            .service
            .config()
            .session_seed
            .unwrap_or_else(rand::random);
        let session = Session::new(guild_id, seed)
            .with_players(players)
            .with_settings(settings);
        self.service.create_session(session).await
    }

    /// Runs one full night for `guild_id` on the current task.
    pub async fn run_night(&self, guild_id: GuildId) -> Result<NightOutcome> {
        run_night(&self.service, &self.sequencer, guild_id).await
    }

    /// Runs one full night for `guild_id` on a new task.
    pub fn spawn_night(&self, guild_id: GuildId) -> JoinHandle<Result<NightOutcome>> {
        let service = self.service.clone();
        let sequencer = Arc::clone(&self.sequencer);
        tokio::spawn(async move { run_night(&service, &sequencer, guild_id).await })
    }

    /// Waits for a night started with [`spawn_night`](Self::spawn_night).
    pub async fn join_night(handle: JoinHandle<Result<NightOutcome>>) -> Result<NightOutcome> {
        handle.await.map_err(RuntimeError::WorkerJoin)?
    }
}

async fn run_night(
    service: &NightService,
    sequencer: &NightSequencer,
    guild_id: GuildId,
) -> Result<NightOutcome> {
    let day = service.start_night(guild_id).await?;
    let ctx = NightContext {
        guild_id,
        service: service.clone(),
    };

    let report = sequencer.run(&ctx).await;
    debug!(target: "runtime::sequencer", guild_id, day, tasks = report.len(), "sequence finished");

    let outcome = service.end_night(guild_id).await?;
    info!(target: "runtime::sequencer", guild_id, day, deaths = outcome.deaths.len(), "night over");
    Ok(outcome)
}

/// Builder for [`NightRuntime`]; every collaborator has a default.
pub struct NightRuntimeBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn SessionRepository>>,
    prompts: Option<Arc<dyn PromptPort>>,
    registry: Option<ActionRegistry>,
    rng: Option<Arc<dyn RngOracle>>,
    tasks: Option<Vec<Arc<dyn NightTask>>>,
}

impl NightRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            prompts: None,
            registry: None,
            rng: None,
            tasks: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Session storage (default: in-memory).
    pub fn repository(mut self, repository: Arc<dyn SessionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Player-facing UI (default: logging only).
    pub fn prompts(mut self, prompts: Arc<dyn PromptPort>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Action set (default: every built-in action).
    pub fn registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn rng(mut self, rng: Arc<dyn RngOracle>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Replaces the standard Start/Wait/Cleanup task list.
    pub fn tasks(mut self, tasks: Vec<Arc<dyn NightTask>>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn build(self) -> NightRuntime {
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemorySessionRepository::new()));
        let coordinator = Arc::new(SessionCoordinator::new(
            repository,
            self.config.notify_capacity,
        ));
        let registry = Arc::new(
            self.registry
                .unwrap_or_else(ActionRegistry::with_builtin_actions),
        );
        let rng = self.rng.unwrap_or_else(|| Arc::new(PcgRng));
        let prompts = self
            .prompts
            .unwrap_or_else(|| Arc::new(LoggingPromptPort));
        let events = EventBus::with_capacity(self.config.event_capacity);
        let sequencer = match self.tasks {
            Some(tasks) => NightSequencer::new(tasks),
            None => NightSequencer::standard(),
        };

        let service = NightService::new(coordinator, registry, rng, prompts, events, self.config);
        NightRuntime {
            service,
            sequencer: Arc::new(sequencer),
        }
    }
}
