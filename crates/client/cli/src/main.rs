//! Demo driver: several guilds play concurrent nights with scripted bots.
mod announcer;
mod bots;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use werewolf_core::GameSettings;
use werewolf_runtime::{ChannelPromptPort, NightRuntime};

use config::DemoConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    setup_logging();

    let demo = DemoConfig::from_env();
    let (port, prompts) = ChannelPromptPort::new();
    let runtime = NightRuntime::builder()
        .config(demo.runtime.clone())
        .prompts(Arc::new(port))
        .build();

    let announcer = tokio::spawn(announcer::run(runtime.service().events().clone()));
    let bots = tokio::spawn(bots::run(
        runtime.service().clone(),
        prompts,
        demo.sleepy_player,
    ));

    for guild_id in demo.guilds() {
        runtime
            .create_session(guild_id, bots::table(), GameSettings::default())
            .await
            .with_context(|| format!("creating session for guild {guild_id}"))?;
    }

    for night in 1..=demo.nights {
        info!(night, guilds = demo.guild_count, "starting nights");
        let handles: Vec<_> = demo
            .guilds()
            .map(|guild_id| (guild_id, runtime.spawn_night(guild_id)))
            .collect();
        for (guild_id, handle) in handles {
            let outcome = NightRuntime::join_night(handle)
                .await
                .with_context(|| format!("night {night} of guild {guild_id}"))?;
            info!(
                guild_id,
                day = outcome.resolution.day,
                deaths = ?outcome.deaths.iter().map(|d| d.player).collect::<Vec<_>>(),
                "night finished"
            );
            for (player, action) in &outcome.granted {
                bots::fire_revenge(runtime.service(), guild_id, *player, *action).await;
            }
        }
    }

    bots.abort();
    announcer.abort();
    Ok(())
}

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
