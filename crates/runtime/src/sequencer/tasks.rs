//! Start/Wait/Cleanup tasks shared by every night sub-phase.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, warn};
use werewolf_core::engine::{
    eligible_targets, has_acted_in, is_phase_complete, phase_actions, phase_actors, should_run,
};
use werewolf_core::{ActionId, Day, NightEngine, NightPhase, PlayerId, SubmitOutcome, TimeoutOutcome};

use super::{NightContext, NightTask, TaskFlow, TaskKind};
use crate::api::Result;
use crate::events::{ActionEvent, Event, PhaseEvent};

/// Wall clock in epoch milliseconds.
fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Whether the sub-phase is needed tonight; shared by all three tasks.
async fn phase_needed(ctx: &NightContext, phase: NightPhase) -> bool {
    match ctx.service.session(ctx.guild_id) {
        Ok(session) => should_run(&session, ctx.service.registry(), phase),
        Err(error) => {
            warn!(target: "runtime::sequencer", guild_id = ctx.guild_id, %phase, %error, "cannot read session");
            false
        }
    }
}

/// Every Start, Wait and Cleanup task in night order.
pub fn night_tasks() -> Vec<Arc<dyn NightTask>> {
    NightPhase::ORDER
        .into_iter()
        .flat_map(|phase| -> [Arc<dyn NightTask>; 3] {
            [
                Arc::new(PhaseStart::new(phase)),
                Arc::new(PhaseWait::new(phase)),
                Arc::new(PhaseCleanup::new(phase)),
            ]
        })
        .collect()
}

/// Prompts computed under the lock and sent after it is released.
#[derive(Default)]
struct PromptPlan {
    day: Day,
    ends_at: u64,
    actors: Vec<(PlayerId, Vec<ActionId>)>,
    group: Option<(ActionId, Vec<PlayerId>, Vec<PlayerId>)>,
    cannot_act: Vec<PlayerId>,
}

fn plan_prompts(engine: &mut NightEngine<'_>, phase: NightPhase) -> PromptPlan {
    let mut plan = PromptPlan::default();

    if let Some(action @ ActionId::WerewolfKill) = phase.dedicated_action() {
        let electorate = engine.open_group_vote(action);
        let targets = electorate
            .first()
            .map(|voter| eligible_targets(engine.session(), engine.registry(), *voter, action))
            .unwrap_or_default();
        plan.group = Some((action, electorate, targets));
    } else {
        if phase == NightPhase::RoleActions {
            plan.cannot_act = engine.skip_feared();
        }
        let session = engine.session();
        let registry = engine.registry();
        plan.actors = phase_actors(session, registry, phase)
            .into_iter()
            .filter(|actor| !has_acted_in(session, *actor, phase))
            .map(|actor| (actor, phase_actions(session, registry, actor, phase)))
            .filter(|(_, actions)| !actions.is_empty())
            .collect();
    }

    let session = engine.session();
    plan.day = session.day;
    plan.ends_at = session.night.phase_ends_at;
    plan
}

/// Marks the sub-phase active and sends its prompts.
pub struct PhaseStart {
    phase: NightPhase,
}

impl PhaseStart {
    pub fn new(phase: NightPhase) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl NightTask for PhaseStart {
    fn phase(&self) -> NightPhase {
        self.phase
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Start
    }

    async fn should_execute(&self, ctx: &NightContext) -> bool {
        phase_needed(ctx, self.phase).await
    }

    async fn run(&self, ctx: &NightContext) -> Result<TaskFlow> {
        let guild_id = ctx.guild_id;
        let phase = self.phase;
        let window_ms =
            u64::try_from(ctx.service.config().window(phase).as_millis()).unwrap_or(u64::MAX);
        let started_at = now_ms();

        let plan = ctx
            .service
            .with_engine(guild_id, move |engine| {
                engine.begin_phase(phase, started_at, window_ms);
                plan_prompts(engine, phase)
            })
            .await?;

        debug!(
            target: "runtime::sequencer",
            guild_id,
            day = plan.day,
            %phase,
            actors = plan.actors.len(),
            "sub-phase started"
        );
        ctx.service.events().publish(Event::Phase(PhaseEvent::PhaseStarted {
            guild_id,
            day: plan.day,
            phase,
            ends_at: plan.ends_at,
        }));

        let prompts = ctx.service.prompts();
        if let Some((action, electorate, targets)) = plan.group {
            prompts
                .prompt_group(guild_id, action, electorate, targets, plan.ends_at)
                .await;
        }
        for (actor, actions) in plan.actors {
            prompts
                .prompt_actor(guild_id, actor, phase, actions, plan.ends_at)
                .await;
        }
        for actor in plan.cannot_act {
            prompts.notify_cannot_act(guild_id, actor).await;
        }
        ctx.service.coordinator().notify(guild_id);
        Ok(TaskFlow::Continue)
    }
}

/// Suspends until every expected actor is done or the window closes.
pub struct PhaseWait {
    phase: NightPhase,
}

impl PhaseWait {
    pub fn new(phase: NightPhase) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl NightTask for PhaseWait {
    fn phase(&self) -> NightPhase {
        self.phase
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Wait
    }

    async fn should_execute(&self, ctx: &NightContext) -> bool {
        phase_needed(ctx, self.phase).await
    }

    async fn run(&self, ctx: &NightContext) -> Result<TaskFlow> {
        let guild_id = ctx.guild_id;
        let phase = self.phase;
        let session = ctx.service.session(guild_id)?;
        let remaining = session.night.phase_ends_at.saturating_sub(now_ms());
        let deadline = Instant::now() + Duration::from_millis(remaining);

        let registry = ctx.service.registry();
        let early = ctx
            .service
            .coordinator()
            .wait_for(guild_id, deadline, |session| {
                is_phase_complete(session, registry, phase)
            })
            .await;

        debug!(target: "runtime::sequencer", guild_id, %phase, early, "wait finished");
        Ok(if early {
            TaskFlow::PhaseDone
        } else {
            TaskFlow::Continue
        })
    }
}

/// Closes the sub-phase: resolves the vote, expires open prompts, clears the
/// marker. Runs even when the sub-phase stopped early or failed.
pub struct PhaseCleanup {
    phase: NightPhase,
}

impl PhaseCleanup {
    pub fn new(phase: NightPhase) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl NightTask for PhaseCleanup {
    fn phase(&self) -> NightPhase {
        self.phase
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Cleanup
    }

    fn is_skippable(&self) -> bool {
        false
    }

    async fn should_execute(&self, ctx: &NightContext) -> bool {
        phase_needed(ctx, self.phase).await
    }

    async fn run(&self, ctx: &NightContext) -> Result<TaskFlow> {
        let guild_id = ctx.guild_id;
        let phase = self.phase;

        let (day, vote, timeouts): (Day, Option<SubmitOutcome>, Vec<TimeoutOutcome>) = ctx
            .service
            .with_engine(guild_id, move |engine| {
                let vote = phase
                    .dedicated_action()
                    .filter(|action| *action == ActionId::WerewolfKill)
                    .and_then(|action| engine.close_group_vote(action));
                let timeouts = engine.expire_pending(phase);
                engine.end_phase();
                (engine.session().day, vote, timeouts)
            })
            .await?;

        let prompts = ctx.service.prompts();
        let events = ctx.service.events();
        prompts.close_prompts(guild_id, phase).await;

        for outcome in &timeouts {
            debug!(
                target: "runtime::sequencer",
                guild_id,
                actor = outcome.actor,
                status = %outcome.status,
                "prompt expired"
            );
            prompts.notify_timeout(guild_id, outcome.clone()).await;
            events.publish(Event::Action(ActionEvent::ActionTimedOut {
                guild_id,
                outcome: outcome.clone(),
            }));
        }
        if let Some(outcome) = vote {
            events.publish(Event::Action(ActionEvent::ActionSubmitted { guild_id, outcome }));
        }
        events.publish(Event::Phase(PhaseEvent::PhaseEnded {
            guild_id,
            day,
            phase,
            timed_out: timeouts.len(),
        }));
        ctx.service.coordinator().notify(guild_id);
        Ok(TaskFlow::Continue)
    }
}
