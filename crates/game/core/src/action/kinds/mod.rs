//! Built-in role actions.
//!
//! Each action is a unit-like struct implementing [`RoleAction`]; actions that
//! differ only by definition (gifted variants) share one struct.
pub mod dream_weaver;
pub mod guard;
pub mod magician;
pub mod merchant;
pub mod nightmare;
pub mod resolution;
pub mod revenge;
pub mod seer;
pub mod witch;
pub mod wolf;

pub use dream_weaver::DreamWeaverLink;
pub use guard::Protect;
pub use magician::MagicianSwap;
pub use merchant::MerchantTrade;
pub use nightmare::NightmareFear;
pub use resolution::DeathResolution;
pub use revenge::Revenge;
pub use seer::SeerCheck;
pub use witch::{Antidote, Poison};
pub use wolf::{WerewolfKill, WolfExtraKill};

use crate::action::{ExecuteError, RoleAction, RoleActionInstance, ValidationError};
use crate::state::{Day, PlayerId};

/// Every built-in action, in no particular order.
pub fn builtin() -> Vec<Box<dyn RoleAction>> {
    vec![
        Box::new(NightmareFear),
        Box::new(MagicianSwap),
        Box::new(WerewolfKill),
        Box::new(WolfExtraKill),
        Box::new(DreamWeaverLink),
        Box::new(Protect::guard()),
        Box::new(Protect::merchant()),
        Box::new(Antidote),
        Box::new(Poison::witch()),
        Box::new(Poison::merchant()),
        Box::new(MerchantTrade::seer()),
        Box::new(MerchantTrade::poison()),
        Box::new(MerchantTrade::guard()),
        Box::new(Revenge::hunter()),
        Box::new(Revenge::wolf_king()),
        Box::new(SeerCheck::seer()),
        Box::new(SeerCheck::merchant()),
        Box::new(DeathResolution),
    ]
}

pub(crate) fn previous_day(day: Day) -> Option<Day> {
    day.checked_sub(1)
}

pub(crate) fn reject_self(actor: PlayerId, targets: &[PlayerId]) -> Result<(), ValidationError> {
    if targets.contains(&actor) {
        Err(ValidationError::Rule("cannot target yourself"))
    } else {
        Ok(())
    }
}

/// First target of an instance that passed validation.
pub(crate) fn target_of(instance: &RoleActionInstance) -> Result<PlayerId, ExecuteError> {
    let action = instance.action_id.ok_or(ExecuteError::NoActionSelected)?;
    instance
        .first_target()
        .ok_or(ExecuteError::NoTarget { action })
}
