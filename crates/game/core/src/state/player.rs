use crate::role::{Camp, Role};

/// Seat number of a player within a session. Negative values are sentinels.
pub type PlayerId = i32;

/// A seated player.
///
/// A player holds one or two roles in order. Each death marks the first
/// still-living role as dead; the player is alive while fewer roles are dead
/// than held.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub roles: Vec<Role>,
    pub dead_roles: Vec<Role>,
    /// Set once the player has finished acting in the current phase.
    pub action_submitted: bool,
}

impl Player {
    pub fn new(id: PlayerId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            roles: roles.into_iter().collect(),
            dead_roles: Vec::new(),
            action_submitted: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.roles.is_empty() && self.dead_roles.len() < self.roles.len()
    }

    pub fn is_wolf(&self) -> bool {
        self.roles.iter().any(|role| role.is_wolf())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Roles that have not been marked dead yet, honoring duplicates.
    pub fn living_roles(&self) -> Vec<Role> {
        let mut remaining = self.roles.clone();
        for dead in &self.dead_roles {
            if let Some(pos) = remaining.iter().position(|r| r == dead) {
                remaining.remove(pos);
            }
        }
        remaining
    }

    pub fn has_living_role(&self, role: Role) -> bool {
        self.living_roles().contains(&role)
    }

    /// Role used as the actor snapshot on new action instances.
    pub fn primary_role(&self) -> Option<Role> {
        self.living_roles()
            .first()
            .copied()
            .or_else(|| self.roles.first().copied())
    }

    pub fn camp(&self) -> Option<Camp> {
        self.primary_role().map(Role::camp)
    }

    /// Marks the first living role as dead and returns it.
    ///
    /// Returns `None` when the player was already dead.
    pub fn mark_dead(&mut self) -> Option<Role> {
        if !self.is_alive() {
            return None;
        }
        let killed = self.living_roles().first().copied()?;
        self.dead_roles.push(killed);
        Some(killed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_role_player_survives_first_death() {
        let mut player = Player::new(3, [Role::Seer, Role::Hunter]);

        assert_eq!(player.mark_dead(), Some(Role::Seer));
        assert!(player.is_alive());
        assert_eq!(player.living_roles(), vec![Role::Hunter]);

        assert_eq!(player.mark_dead(), Some(Role::Hunter));
        assert!(!player.is_alive());
        assert_eq!(player.mark_dead(), None);
    }

    #[test]
    fn duplicated_roles_die_one_at_a_time() {
        let mut player = Player::new(1, [Role::Villager, Role::Villager]);
        player.mark_dead();
        assert!(player.has_living_role(Role::Villager));
        assert!(player.is_alive());
    }

    #[test]
    fn player_without_roles_is_not_alive() {
        assert!(!Player::new(9, []).is_alive());
    }
}
