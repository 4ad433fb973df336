//! Demo settings loaded from the environment.
use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;

use werewolf_core::{GuildId, PlayerId};
use werewolf_runtime::RuntimeConfig;

#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub runtime: RuntimeConfig,
    pub guild_count: u64,
    pub nights: u32,
    /// Player who never answers, so timeouts show up in the log.
    pub sleepy_player: Option<PlayerId>,
}

impl DemoConfig {
    /// Environment variables:
    /// - `DEMO_GUILDS` (default: 2)
    /// - `DEMO_NIGHTS` (default: 2)
    /// - `DEMO_WINDOW_MS` uniform sub-phase window (default: 1500)
    /// - `DEMO_SLEEPY_PLAYER` (default: none)
    /// - every `NIGHT_*` variable read by [`RuntimeConfig::from_env`]
    pub fn from_env() -> Self {
        let window = read_env::<u64>("DEMO_WINDOW_MS").unwrap_or(1_500);
        let runtime = RuntimeConfig::from_env().with_uniform_window(Duration::from_millis(window));

        Self {
            runtime,
            guild_count: read_env("DEMO_GUILDS").unwrap_or(2),
            nights: read_env("DEMO_NIGHTS").unwrap_or(2),
            sleepy_player: read_env("DEMO_SLEEPY_PLAYER"),
        }
    }

    pub fn guilds(&self) -> RangeInclusive<GuildId> {
        1..=self.guild_count
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}
