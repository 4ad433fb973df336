//! Logs phase boundaries and night results as they are published.
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use werewolf_runtime::{Event, EventBus, PhaseEvent, ResolutionEvent, Topic};

pub async fn run(events: EventBus) {
    let mut phases = events.subscribe(Topic::Phase);
    let mut resolutions = events.subscribe(Topic::Resolution);

    loop {
        let received = tokio::select! {
            event = phases.recv() => event,
            event = resolutions.recv() => event,
        };
        match received {
            Ok(event) => announce(&event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(target: "cli::announcer", skipped, "announcer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn announce(event: &Event) {
    match event {
        Event::Phase(PhaseEvent::PhaseStarted {
            guild_id,
            day,
            phase,
            ..
        }) => info!(target: "cli::announcer", guild_id, day, %phase, "phase opened"),
        Event::Phase(PhaseEvent::PhaseEnded {
            guild_id,
            phase,
            timed_out,
            ..
        }) => info!(target: "cli::announcer", guild_id, %phase, timed_out, "phase closed"),
        Event::Resolution(
            ResolutionEvent::NightResolved { guild_id, outcome }
            | ResolutionEvent::DeathsApplied { guild_id, outcome },
        ) => {
            for death in &outcome.deaths {
                info!(
                    target: "cli::announcer",
                    guild_id,
                    player = death.player,
                    cause = %death.cause,
                    "player died"
                );
            }
            if outcome.deaths.is_empty() {
                info!(target: "cli::announcer", guild_id, "peaceful night");
            }
        }
        Event::Action(_) => {}
    }
}
