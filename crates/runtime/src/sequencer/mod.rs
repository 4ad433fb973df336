//! Night sub-phase sequencer.
//!
//! A night is an ordered list of [`NightTask`]s, one Start/Wait/Cleanup triad
//! per [`NightPhase`]. The driver runs them strictly in order for one guild:
//!
//! - The first task of a sub-phase decides through `should_execute` whether
//!   the whole triad runs.
//! - A task that reports [`TaskFlow::PhaseDone`] (early completion) or fails
//!   stops its sub-phase: the remaining *skippable* tasks of that sub-phase
//!   are skipped, non-skippable ones (cleanup) still run.
//! - Other sub-phases are never affected.
mod tasks;

pub use tasks::{PhaseCleanup, PhaseStart, PhaseWait, night_tasks};

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use werewolf_core::{GuildId, NightPhase};

use crate::api::Result;
use crate::service::NightService;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Start,
    Wait,
    Cleanup,
}

/// What a finished task asks of the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskFlow {
    Continue,
    /// Every expected actor is done; skip the rest of this sub-phase.
    PhaseDone,
}

/// Everything a task may touch while it runs.
#[derive(Clone)]
pub struct NightContext {
    pub guild_id: GuildId,
    pub service: NightService,
}

#[async_trait]
pub trait NightTask: Send + Sync {
    fn phase(&self) -> NightPhase;

    fn kind(&self) -> TaskKind;

    fn is_skippable(&self) -> bool {
        true
    }

    async fn should_execute(&self, ctx: &NightContext) -> bool;

    async fn run(&self, ctx: &NightContext) -> Result<TaskFlow>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Ran,
    /// Ran and reported early completion.
    Completed,
    Failed,
    /// Skipped after its sub-phase stopped.
    Skipped,
    /// Its sub-phase was not needed tonight.
    NotScheduled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskRecord {
    pub phase: NightPhase,
    pub kind: TaskKind,
    pub status: TaskStatus,
}

pub struct NightSequencer {
    tasks: Vec<Arc<dyn NightTask>>,
}

impl NightSequencer {
    pub fn new(tasks: Vec<Arc<dyn NightTask>>) -> Self {
        Self { tasks }
    }

    /// Start/Wait/Cleanup for every sub-phase, in night order.
    pub fn standard() -> Self {
        Self::new(night_tasks())
    }

    pub fn tasks(&self) -> &[Arc<dyn NightTask>] {
        &self.tasks
    }

    /// Drives every task once and reports what happened to each.
    pub async fn run(&self, ctx: &NightContext) -> Vec<TaskRecord> {
        let guild_id = ctx.guild_id;
        let mut queue: VecDeque<&Arc<dyn NightTask>> = self.tasks.iter().collect();
        let mut report = Vec::with_capacity(self.tasks.len());
        let mut checked: Option<NightPhase> = None;
        let mut stopped: Option<NightPhase> = None;

        while let Some(task) = queue.pop_front() {
            let phase = task.phase();
            let record = |status| TaskRecord {
                phase,
                kind: task.kind(),
                status,
            };

            if checked != Some(phase) {
                checked = Some(phase);
                if !task.should_execute(ctx).await {
                    debug!(target: "runtime::sequencer", guild_id, %phase, "sub-phase not needed");
                    report.push(record(TaskStatus::NotScheduled));
                    while let Some(next) = queue.front().filter(|next| next.phase() == phase) {
                        report.push(TaskRecord {
                            phase,
                            kind: next.kind(),
                            status: TaskStatus::NotScheduled,
                        });
                        queue.pop_front();
                    }
                    continue;
                }
            }

            if stopped == Some(phase) && task.is_skippable() {
                debug!(target: "runtime::sequencer", guild_id, %phase, kind = ?task.kind(), "task skipped");
                report.push(record(TaskStatus::Skipped));
                continue;
            }

            match task.run(ctx).await {
                Ok(TaskFlow::Continue) => report.push(record(TaskStatus::Ran)),
                Ok(TaskFlow::PhaseDone) => {
                    debug!(target: "runtime::sequencer", guild_id, %phase, "sub-phase finished early");
                    stopped = Some(phase);
                    report.push(record(TaskStatus::Completed));
                }
                Err(error) => {
                    warn!(
                        target: "runtime::sequencer",
                        guild_id,
                        %phase,
                        kind = ?task.kind(),
                        %error,
                        "task failed; stopping sub-phase"
                    );
                    stopped = Some(phase);
                    report.push(record(TaskStatus::Failed));
                }
            }
        }
        report
    }
}
