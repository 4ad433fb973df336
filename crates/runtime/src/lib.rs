//! Async orchestration for werewolf nights across many guilds.
//!
//! This crate wraps the synchronous [`werewolf_core::NightEngine`] in a
//! per-guild locking coordinator and drives each night's sub-phases through a
//! task sequencer. Consumers embed [`NightRuntime`], plug in a [`PromptPort`]
//! for their UI, and subscribe to the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`service`] is the façade every submission and night step goes through
//! - [`sequencer`] holds the Start/Wait/Cleanup tasks and their driver
//! - [`coordinator`] serializes access per guild and wakes waiting phases
//! - [`api`] exposes errors and the prompt port
//! - [`events`] provides the topic-based event bus
//! - [`repository`] stores session documents
pub mod api;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod sequencer;
pub mod service;

pub use api::{ChannelPromptPort, LoggingPromptPort, Prompt, PromptPort, Result, RuntimeError};
pub use config::{PhaseWindows, RuntimeConfig};
pub use coordinator::SessionCoordinator;
pub use events::{ActionEvent, Event, EventBus, PhaseEvent, ResolutionEvent, Topic};
pub use repository::{InMemorySessionRepository, RepositoryError, SessionRepository};
pub use runtime::{NightRuntime, NightRuntimeBuilder};
pub use sequencer::{
    NightContext, NightSequencer, NightTask, TaskFlow, TaskKind, TaskRecord, TaskStatus,
};
pub use service::NightService;
