//! Final reducer of the night fold.
//!
//! Runs after every submitted action (priority 1000) and settles the
//! accumulated result into at most one death cause per player:
//!
//! 1. Dream weaver: the sleepwalker is immune, unless linked two nights
//!    running or the dream weaver dies tonight.
//! 2. Saves lift every cause; protection lifts only the wolf kill. A wolf
//!    victim that is both saved and protected dies of double protection.
//! 3. A target hit by two wolf kills dies even if saved or protected.
//! 4. Alive ghost riders shrug off night damage.
//! 5. Each player keeps its highest-precedence cause.
use std::collections::BTreeSet;

use crate::action::kinds::previous_day;
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, DeathCause, ExecuteError, RoleAction,
    RoleActionDefinition, RoleActionInstance,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const DEATH_RESOLUTION: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::DeathResolution,
    NightConfig::DEATH_RESOLUTION_PRIORITY,
    ActionTiming::Night,
)
.targets(0);

#[derive(Debug, Clone, Copy, Default)]
pub struct DeathResolution;

impl DeathResolution {
    fn settle_dream_weaver(session: &Session, acc: &mut ActionExecutionResult) {
        let Some(&sleepwalker) = session.night.dream_targets.get(&session.day) else {
            return;
        };
        acc.remove_everywhere(sleepwalker);

        let linked_twice = previous_day(session.day)
            .and_then(|day| session.night.dream_targets.get(&day))
            .is_some_and(|last| *last == sleepwalker);
        let weaver_dies = session
            .holders_of(Role::DreamWeaver)
            .into_iter()
            .any(|weaver| acc.is_dying(weaver));

        if linked_twice || weaver_dies {
            acc.add_death(DeathCause::DreamWeaver, sleepwalker);
        }
    }

    fn settle_saves(acc: &mut ActionExecutionResult) {
        let double_protected: Vec<PlayerId> = acc
            .saved
            .intersection(&acc.protected)
            .copied()
            .filter(|id| acc.dies_by(DeathCause::Werewolf, *id))
            .collect();

        let saved: Vec<PlayerId> = acc.saved.iter().copied().collect();
        for id in saved {
            acc.remove_everywhere(id);
        }
        if let Some(bitten) = acc.deaths.get_mut(&DeathCause::Werewolf) {
            for id in &acc.protected {
                bitten.remove(id);
            }
        }
        for id in double_protected {
            acc.add_death(DeathCause::DoubleProtection, id);
        }
    }

    fn settle_double_kill(acc: &mut ActionExecutionResult) {
        let mut seen = BTreeSet::new();
        let doubled: Vec<PlayerId> = acc
            .metadata
            .wolf_kills
            .iter()
            .copied()
            .filter(|id| !seen.insert(*id))
            .collect();
        for id in doubled {
            if !acc.is_dying(id) {
                acc.add_death(DeathCause::Werewolf, id);
            }
        }
    }

    fn shield_ghost_riders(session: &Session, acc: &mut ActionExecutionResult) {
        let riders: Vec<PlayerId> = session
            .holders_of(Role::GhostRider)
            .into_iter()
            .filter(|id| {
                session
                    .player(*id)
                    .is_some_and(|p| p.has_living_role(Role::GhostRider))
            })
            .collect();
        for (cause, ids) in acc.deaths.iter_mut() {
            if cause.is_night_damage() {
                for rider in &riders {
                    ids.remove(rider);
                }
            }
        }
    }
}

impl RoleAction for DeathResolution {
    fn definition(&self) -> &RoleActionDefinition {
        &DEATH_RESOLUTION
    }

    fn eligible_targets(
        &self,
        _session: &Session,
        _actor: PlayerId,
        _alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        Vec::new()
    }

    fn execute(
        &self,
        session: &mut Session,
        _instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        Self::settle_dream_weaver(session, &mut accumulated);
        Self::settle_saves(&mut accumulated);
        Self::settle_double_kill(&mut accumulated);
        Self::shield_ghost_riders(session, &mut accumulated);
        accumulated.dedupe_causes();
        Ok(accumulated)
    }
}
