use std::collections::BTreeMap;

use crate::config::GameSettings;
use crate::env::compute_seed;
use crate::role::Role;
use crate::state::night::{ActionStatusEntry, NightState, NightStatus};
use crate::state::{Player, PlayerId};

/// Guild (server) identifier. One session runs per guild.
pub type GuildId = u64;

/// Day counter. Incremented when a night starts; night N belongs to day N.
pub type Day = u32;

/// Coarse step of the game flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameStep {
    #[default]
    Setup,
    Night,
    DeathAnnouncement,
    Day,
    Ended,
}

/// Aggregate root for one game.
///
/// Players are owned by id; nothing inside a player points back here.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Session {
    pub guild_id: GuildId,
    pub day: Day,
    pub step: GameStep,
    pub players: BTreeMap<PlayerId, Player>,
    pub settings: GameSettings,
    pub night: NightState,
    /// Base seed for every random decision made in this game.
    ///
    /// Set once at creation. Combined with `rng_nonce` so replays reproduce
    /// the same tie-breaks and timeout picks.
    pub seed: u64,
    pub rng_nonce: u64,
}

impl Session {
    pub fn new(guild_id: GuildId, seed: u64) -> Self {
        Self {
            guild_id,
            day: 0,
            step: GameStep::Setup,
            players: BTreeMap::new(),
            settings: GameSettings::default(),
            night: NightState::new(),
            seed,
            rng_nonce: 0,
        }
    }

    /// Seats players; ids must be unique.
    #[must_use]
    pub fn with_players(mut self, players: impl IntoIterator<Item = Player>) -> Self {
        for player in players {
            self.players.insert(player.id, player);
        }
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn is_night(&self) -> bool {
        self.step == GameStep::Night
    }

    /// Ids of alive players in seat order.
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect()
    }

    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(Player::is_alive)
    }

    /// Whether some alive player still holds `role` unkilled.
    pub fn is_role_alive(&self, role: Role) -> bool {
        self.players
            .values()
            .any(|p| p.is_alive() && p.has_living_role(role))
    }

    /// First alive player holding `role` unkilled.
    pub fn find_alive_with_role(&self, role: Role) -> Option<PlayerId> {
        self.players
            .values()
            .find(|p| p.is_alive() && p.has_living_role(role))
            .map(|p| p.id)
    }

    /// Every player holding `role`, alive or not.
    pub fn holders_of(&self, role: Role) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.has_role(role))
            .map(|p| p.id)
            .collect()
    }

    pub fn is_wolf(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(Player::is_wolf)
    }

    /// Derives the next deterministic seed for a random decision.
    pub fn next_seed(&mut self, context: u32) -> u64 {
        self.rng_nonce += 1;
        compute_seed(self.seed, self.rng_nonce, self.day, context)
    }

    /// Typed dashboard snapshot of the current night.
    pub fn night_status(&self) -> NightStatus {
        NightStatus {
            day: self.day,
            phase: self.night.phase,
            phase_started_at: self.night.phase_started_at,
            phase_ends_at: self.night.phase_ends_at,
            votes: self
                .night
                .group_states
                .iter()
                .map(|(id, state)| (*id, state.votes.clone()))
                .collect(),
            action_statuses: self
                .night
                .submitted_actions
                .iter()
                .map(|inst| ActionStatusEntry {
                    actor: inst.actor,
                    action_id: inst.action_id,
                    status: inst.status,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session() -> Session {
        Session::new(42, 7).with_players([
            Player::new(1, [Role::Werewolf]),
            Player::new(2, [Role::Seer]),
            Player::new(3, [Role::Villager]),
        ])
    }

    #[test]
    fn alive_ids_follow_seat_order() {
        let mut session = create_test_session();
        session.player_mut(2).unwrap().mark_dead();

        assert_eq!(session.alive_ids(), vec![1, 3]);
        assert!(!session.is_role_alive(Role::Seer));
        assert_eq!(session.holders_of(Role::Seer), vec![2]);
    }

    #[test]
    fn next_seed_advances_nonce() {
        let mut session = create_test_session();
        let a = session.next_seed(0);
        let b = session.next_seed(0);

        assert_ne!(a, b);
        assert_eq!(session.rng_nonce, 2);
    }
}
