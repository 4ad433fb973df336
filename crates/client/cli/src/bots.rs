//! Scripted players answering prompts with random legal choices.
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use werewolf_core::engine::eligible_targets;
use werewolf_core::{
    ActionId, GuildId, Player, PlayerId, Role, SKIP_TARGET_ID, SubmissionSource,
};
use werewolf_runtime::{NightService, Prompt};

/// Chance that a bot passes on an optional action.
const SKIP_CHANCE: f64 = 0.25;

pub fn table() -> Vec<Player> {
    vec![
        Player::new(1, [Role::Werewolf]),
        Player::new(2, [Role::Werewolf]),
        Player::new(3, [Role::Nightmare]),
        Player::new(4, [Role::Seer]),
        Player::new(5, [Role::Witch]),
        Player::new(6, [Role::Guard]),
        Player::new(7, [Role::Hunter]),
        Player::new(8, [Role::Villager]),
        Player::new(9, [Role::Villager]),
    ]
}

pub async fn run(
    service: NightService,
    mut prompts: UnboundedReceiver<Prompt>,
    sleepy: Option<PlayerId>,
) {
    while let Some(prompt) = prompts.recv().await {
        match prompt {
            Prompt::Group {
                guild_id,
                action,
                electorate,
                targets,
                ..
            } => {
                for voter in electorate.into_iter().filter(|id| Some(*id) != sleepy) {
                    let Some(target) = targets.choose(&mut rand::thread_rng()).copied() else {
                        continue;
                    };
                    if let Err(error) = service
                        .submit_group_vote(guild_id, voter, action, target)
                        .await
                    {
                        warn!(target: "cli::bots", guild_id, voter, %error, "vote refused");
                    }
                }
            }
            Prompt::Actor {
                guild_id,
                actor,
                actions,
                ..
            } => {
                if Some(actor) == sleepy {
                    debug!(target: "cli::bots", guild_id, actor, "sleeping through the prompt");
                    continue;
                }
                let Some((action, targets)) = decide(&service, guild_id, actor, &actions) else {
                    continue;
                };
                submit(&service, guild_id, actor, action, targets).await;
            }
            Prompt::CannotAct { guild_id, actor } => {
                info!(target: "cli::bots", guild_id, actor, "feared tonight");
            }
            Prompt::TimedOut { guild_id, outcome } => {
                info!(
                    target: "cli::bots",
                    guild_id,
                    actor = outcome.actor,
                    targets = ?outcome.targets,
                    "answered for by the timeout"
                );
            }
            Prompt::Closed { .. } => {}
        }
    }
}

/// Fires a death-trigger action unlocked by the night, e.g. a hunter's shot.
pub async fn fire_revenge(
    service: &NightService,
    guild_id: GuildId,
    actor: PlayerId,
    action: ActionId,
) {
    let Some((action, targets)) = decide(service, guild_id, actor, &[action]) else {
        return;
    };
    submit(service, guild_id, actor, action, targets).await;
}

/// Picks one of `actions` and random eligible targets, or a skip.
fn decide(
    service: &NightService,
    guild_id: GuildId,
    actor: PlayerId,
    actions: &[ActionId],
) -> Option<(ActionId, Vec<PlayerId>)> {
    let mut rng = rand::thread_rng();
    let action = *actions.choose(&mut rng)?;
    let def = service.registry().definition(action)?;
    let session = service.session(guild_id).ok()?;

    let pool = eligible_targets(&session, service.registry(), actor, action);
    let wanted = def.target_count.max(1);
    if pool.len() < wanted || (def.is_optional && rng.gen_bool(SKIP_CHANCE)) {
        return Some((action, vec![SKIP_TARGET_ID]));
    }
    let targets = pool.choose_multiple(&mut rng, wanted).copied().collect();
    Some((action, targets))
}

async fn submit(
    service: &NightService,
    guild_id: GuildId,
    actor: PlayerId,
    action: ActionId,
    targets: Vec<PlayerId>,
) {
    if let Err(error) = service.select_action(guild_id, actor, action).await {
        warn!(target: "cli::bots", guild_id, actor, %action, reason = error.reason(), "choice refused");
        return;
    }
    match service
        .submit_action(guild_id, action, actor, targets, SubmissionSource::Player)
        .await
    {
        Ok(outcome) => {
            debug!(target: "cli::bots", guild_id, actor, %action, status = %outcome.status, "answered");
        }
        Err(error) => {
            warn!(target: "cli::bots", guild_id, actor, %action, reason = error.reason(), "answer refused");
        }
    }
}
