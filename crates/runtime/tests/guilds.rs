use std::sync::Arc;
use std::time::{Duration, Instant};

use werewolf_core::{ActionId, GameSettings, Player, Role, SubmissionSource};
use werewolf_runtime::{
    ChannelPromptPort, Event, NightRuntime, PhaseEvent, RuntimeConfig, RuntimeError, Topic,
};

fn table(offset: i32) -> Vec<Player> {
    vec![
        Player::new(offset + 1, [Role::Werewolf]),
        Player::new(offset + 2, [Role::Seer]),
        Player::new(offset + 3, [Role::Witch]),
        Player::new(offset + 4, [Role::Villager]),
    ]
}

fn silent_runtime(window: Duration) -> NightRuntime {
    NightRuntime::builder()
        .config(RuntimeConfig::default().with_uniform_window(window))
        .build()
}

/// Two guilds whose nights only ever time out run side by side: the total
/// wall time stays close to one night, not two.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn guild_nights_do_not_block_each_other() {
    let window = Duration::from_millis(300);
    let runtime = silent_runtime(window);
    for guild in [1, 2] {
        runtime
            .create_session(guild, table(0), GameSettings::default())
            .await
            .expect("session should be created");
    }

    let started = Instant::now();
    let first = runtime.spawn_night(1);
    let second = runtime.spawn_night(2);
    let first = NightRuntime::join_night(first).await.expect("guild 1 night");
    let second = NightRuntime::join_night(second).await.expect("guild 2 night");
    let elapsed = started.elapsed();

    // voting and role actions both wait out their window in each guild
    assert!(elapsed >= window * 2, "took {elapsed:?}");
    assert!(elapsed < window * 4, "took {elapsed:?}");
    assert_eq!(first.resolution.day, 1);
    assert_eq!(second.resolution.day, 1);
}

#[tokio::test]
async fn duplicate_session_is_refused() {
    let runtime = silent_runtime(Duration::from_millis(20));
    runtime
        .create_session(7, table(0), GameSettings::default())
        .await
        .expect("session should be created");

    let err = runtime
        .create_session(7, table(10), GameSettings::default())
        .await
        .expect_err("guild 7 already has a session");
    assert!(matches!(err, RuntimeError::SessionExists(7)));
}

/// A submission for one guild wakes only that guild's waiting phase.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submission_ends_only_its_own_guilds_phase() {
    let window = Duration::from_millis(600);
    let (port, _prompts) = ChannelPromptPort::new();
    let runtime = NightRuntime::builder()
        .config(RuntimeConfig::default().with_uniform_window(window))
        .prompts(Arc::new(port))
        .build();
    for guild in [1, 2] {
        runtime
            .create_session(guild, table(0), GameSettings::default())
            .await
            .expect("session should be created");
    }
    let mut phases = runtime.subscribe(Topic::Phase);

    let first = runtime.spawn_night(1);
    let second = runtime.spawn_night(2);

    // wait for guild 1's vote to open, then let its lone wolf vote
    loop {
        match phases.recv().await.expect("phase events") {
            Event::Phase(PhaseEvent::PhaseStarted {
                guild_id: 1, phase, ..
            }) if phase == werewolf_core::NightPhase::WerewolfVoting => break,
            _ => continue,
        }
    }
    let voted_at = Instant::now();
    runtime
        .service()
        .submit_group_vote(1, 1, ActionId::WerewolfKill, 4)
        .await
        .expect("vote should be accepted");

    let mut ended = Vec::new();
    while ended.len() < 2 {
        if let Event::Phase(PhaseEvent::PhaseEnded {
            guild_id, phase, ..
        }) = phases.recv().await.expect("phase events")
            && phase == werewolf_core::NightPhase::WerewolfVoting
        {
            ended.push((guild_id, voted_at.elapsed()));
        }
    }
    assert_eq!(ended[0].0, 1);
    assert!(ended[0].1 < window / 2);

    NightRuntime::join_night(first).await.expect("guild 1 night");
    NightRuntime::join_night(second).await.expect("guild 2 night");

    // the refused late submission leaves guild 1 untouched
    let late = runtime
        .service()
        .submit_action(1, ActionId::SeerCheck, 2, vec![1], SubmissionSource::Player)
        .await;
    assert!(late.is_err());
}
