//! Runtime configuration: phase windows, channel sizes, seeding.
use std::env;
use std::time::Duration;

use werewolf_core::NightPhase;

/// Runtime configuration shared across the service and night tasks.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub windows: PhaseWindows,
    /// Capacity of the coordinator's wake-up channel.
    pub notify_capacity: usize,
    /// Capacity of each event bus topic.
    pub event_capacity: usize,
    /// Fixed seed for new sessions; random when `None`.
    pub session_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            windows: PhaseWindows::default(),
            notify_capacity: 256,
            event_capacity: 100,
            session_seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Construct runtime configuration from environment variables.
    ///
    /// Environment variables (seconds unless noted):
    /// - `NIGHT_NIGHTMARE_SECS` (default: 60)
    /// - `NIGHT_MAGICIAN_SECS` (default: 60)
    /// - `NIGHT_WOLF_BROTHER_SECS` (default: 60)
    /// - `NIGHT_VOTING_SECS` (default: 90)
    /// - `NIGHT_ROLE_ACTIONS_SECS` (default: 60)
    /// - `NIGHT_NOTIFY_CAPACITY` (default: 256)
    /// - `NIGHT_EVENT_CAPACITY` (default: 100)
    /// - `NIGHT_SESSION_SEED` (default: random per session)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let phases = [
            (NightPhase::NightmareAction, "NIGHT_NIGHTMARE_SECS"),
            (NightPhase::MagicianAction, "NIGHT_MAGICIAN_SECS"),
            (NightPhase::WolfYoungerBrotherAction, "NIGHT_WOLF_BROTHER_SECS"),
            (NightPhase::WerewolfVoting, "NIGHT_VOTING_SECS"),
            (NightPhase::RoleActions, "NIGHT_ROLE_ACTIONS_SECS"),
        ];
        for (phase, key) in phases {
            if let Some(secs) = read_env::<u64>(key) {
                config.windows.set(phase, Duration::from_secs(secs));
            }
        }
        if let Some(capacity) = read_env::<usize>("NIGHT_NOTIFY_CAPACITY") {
            config.notify_capacity = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("NIGHT_EVENT_CAPACITY") {
            config.event_capacity = capacity.max(1);
        }
        config.session_seed = read_env::<u64>("NIGHT_SESSION_SEED");

        config
    }

    pub fn window(&self, phase: NightPhase) -> Duration {
        self.windows.get(phase)
    }

    /// Uses the same window for every sub-phase.
    #[must_use]
    pub fn with_uniform_window(mut self, window: Duration) -> Self {
        for phase in NightPhase::ORDER {
            self.windows.set(phase, window);
        }
        self
    }

    #[must_use]
    pub fn with_window(mut self, phase: NightPhase, window: Duration) -> Self {
        self.windows.set(phase, window);
        self
    }

    #[must_use]
    pub fn with_session_seed(mut self, seed: u64) -> Self {
        self.session_seed = Some(seed);
        self
    }
}

/// Prompt window per sub-phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseWindows {
    pub nightmare: Duration,
    pub magician: Duration,
    pub wolf_brother: Duration,
    pub voting: Duration,
    pub role_actions: Duration,
}

impl Default for PhaseWindows {
    fn default() -> Self {
        let default = |phase: NightPhase| Duration::from_millis(phase.default_window_ms());
        Self {
            nightmare: default(NightPhase::NightmareAction),
            magician: default(NightPhase::MagicianAction),
            wolf_brother: default(NightPhase::WolfYoungerBrotherAction),
            voting: default(NightPhase::WerewolfVoting),
            role_actions: default(NightPhase::RoleActions),
        }
    }
}

impl PhaseWindows {
    pub fn get(&self, phase: NightPhase) -> Duration {
        match phase {
            NightPhase::NightmareAction => self.nightmare,
            NightPhase::MagicianAction => self.magician,
            NightPhase::WolfYoungerBrotherAction => self.wolf_brother,
            NightPhase::WerewolfVoting => self.voting,
            NightPhase::RoleActions => self.role_actions,
        }
    }

    pub fn set(&mut self, phase: NightPhase, window: Duration) {
        let slot = match phase {
            NightPhase::NightmareAction => &mut self.nightmare,
            NightPhase::MagicianAction => &mut self.magician,
            NightPhase::WolfYoungerBrotherAction => &mut self.wolf_brother,
            NightPhase::WerewolfVoting => &mut self.voting,
            NightPhase::RoleActions => &mut self.role_actions,
        };
        *slot = window;
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_night_constants() {
        let config = RuntimeConfig::default();
        assert_eq!(config.window(NightPhase::WerewolfVoting), Duration::from_secs(90));
        assert_eq!(config.window(NightPhase::RoleActions), Duration::from_secs(60));
        assert_eq!(config.notify_capacity, 256);
    }

    #[test]
    fn overrides_touch_only_their_phase() {
        let config = RuntimeConfig::default()
            .with_uniform_window(Duration::from_millis(50))
            .with_window(NightPhase::WerewolfVoting, Duration::from_millis(80));

        assert_eq!(config.window(NightPhase::MagicianAction), Duration::from_millis(50));
        assert_eq!(config.window(NightPhase::WerewolfVoting), Duration::from_millis(80));
    }
}
