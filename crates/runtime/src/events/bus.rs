//! Broadcast channels, one per [`Topic`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{ActionEvent, PhaseEvent, ResolutionEvent};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Sub-phase start and end
    Phase,
    /// Submissions, votes and timeouts
    Action,
    /// Night outcomes
    Resolution,
}

/// Any runtime event; the variant decides the topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Phase(PhaseEvent),
    Action(ActionEvent),
    Resolution(ResolutionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Phase(_) => Topic::Phase,
            Event::Action(_) => Topic::Action,
            Event::Resolution(_) => Topic::Resolution,
        }
    }
}

struct Channels {
    phase: broadcast::Sender<Event>,
    action: broadcast::Sender<Event>,
    resolution: broadcast::Sender<Event>,
}

/// Fan-out of runtime events to whoever subscribed to their topic.
///
/// Publishing never blocks and never fails; an event sent while its topic
/// has no subscriber is dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// `capacity` bounds each topic; slow subscribers see `Lagged`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Channels {
                phase: broadcast::channel(capacity).0,
                action: broadcast::channel(capacity).0,
                resolution: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Phase => &self.channels.phase,
            Topic::Action => &self.channels.action,
            Topic::Resolution => &self.channels.resolution,
        }
    }

    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!(target: "runtime::events", ?topic, "event dropped, no subscriber");
        }
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use werewolf_core::NightPhase;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut phases = bus.subscribe(Topic::Phase);
        let mut actions = bus.subscribe(Topic::Action);

        bus.publish(Event::Phase(PhaseEvent::PhaseStarted {
            guild_id: 1,
            day: 1,
            phase: NightPhase::RoleActions,
            ends_at: 0,
        }));

        assert!(matches!(phases.recv().await.unwrap(), Event::Phase(_)));
        assert!(actions.try_recv().is_err());
    }
}
