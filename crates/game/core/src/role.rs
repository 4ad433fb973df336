//! Role catalogue and camps.
//!
//! Which actions a role owns is declared on each action definition (its
//! `owners`); the registry derives the per-role view from those.
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Side a role plays for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Camp {
    Werewolf,
    God,
    Villager,
}

impl Camp {
    /// Good camps are the ones ghost-rider reflection applies to.
    pub const fn is_good(self) -> bool {
        matches!(self, Camp::God | Camp::Villager)
    }
}

/// Every role a player can hold.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Villager,
    Werewolf,
    WolfKing,
    WolfBrother,
    WolfYoungerBrother,
    Nightmare,
    Seer,
    Witch,
    Guard,
    Hunter,
    Magician,
    DreamWeaver,
    GhostRider,
    DarkMerchant,
    MiracleMerchant,
}

impl Role {
    pub const fn camp(self) -> Camp {
        match self {
            Role::Werewolf
            | Role::WolfKing
            | Role::WolfBrother
            | Role::WolfYoungerBrother
            | Role::Nightmare => Camp::Werewolf,
            Role::Villager => Camp::Villager,
            _ => Camp::God,
        }
    }

    pub const fn is_wolf(self) -> bool {
        matches!(self.camp(), Camp::Werewolf)
    }
}
