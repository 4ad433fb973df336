//! Game settings and fixed night-phase constants.
use crate::state::PlayerId;

/// Target id used by actors (and vote records) to pass on an action.
pub const SKIP_TARGET_ID: PlayerId = -1;

/// Rules a game host can toggle per session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameSettings {
    /// When the antidote may target the witch.
    pub witch_can_save_self: WitchSelfSave,
    /// Allow wolves to pick another wolf as the night's kill target.
    pub allow_wolf_self_kill: bool,
    /// Hide the dead role in death announcements.
    pub hidden_role_on_death: bool,
}

/// Self-save policy for the witch's antidote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WitchSelfSave {
    Never,
    #[default]
    FirstNightOnly,
    Always,
}

impl WitchSelfSave {
    pub const fn allows(self, day: u32) -> bool {
        match self {
            Self::Never => false,
            Self::FirstNightOnly => day <= 1,
            Self::Always => true,
        }
    }
}

impl GameSettings {
    pub fn new() -> Self {
        Self {
            witch_can_save_self: WitchSelfSave::default(),
            allow_wolf_self_kill: false,
            hidden_role_on_death: true,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed priorities and default windows for the night.
pub struct NightConfig;

impl NightConfig {
    // ===== resolution priorities (lower resolves earlier) =====
    pub const NIGHTMARE_PRIORITY: i32 = 50;
    pub const MAGICIAN_PRIORITY: i32 = 60;
    pub const WEREWOLF_PRIORITY: i32 = 100;
    pub const WOLF_EXTRA_KILL_PRIORITY: i32 = 101;
    pub const DREAM_WEAVER_PRIORITY: i32 = 120;
    pub const GUARD_PRIORITY: i32 = 150;
    pub const MERCHANT_GUARD_PRIORITY: i32 = 151;
    pub const WITCH_ANTIDOTE_PRIORITY: i32 = 200;
    pub const WITCH_POISON_PRIORITY: i32 = 210;
    pub const MERCHANT_POISON_PRIORITY: i32 = 211;
    pub const MERCHANT_TRADE_PRIORITY: i32 = 220;
    pub const REVENGE_PRIORITY: i32 = 250;
    pub const SEER_PRIORITY: i32 = 300;
    pub const MERCHANT_SEER_PRIORITY: i32 = 301;
    pub const DEATH_RESOLUTION_PRIORITY: i32 = 1000;

    // ===== default sub-phase windows (milliseconds) =====
    pub const NIGHTMARE_WINDOW_MS: u64 = 60_000;
    pub const MAGICIAN_WINDOW_MS: u64 = 60_000;
    pub const WOLF_BROTHER_WINDOW_MS: u64 = 60_000;
    pub const WEREWOLF_VOTING_WINDOW_MS: u64 = 90_000;
    pub const ROLE_ACTIONS_WINDOW_MS: u64 = 60_000;

    /// Player id used for engine-originated instances (e.g. death resolution).
    pub const SYSTEM_ACTOR: PlayerId = 0;
}
