//! Authoritative session state.
//!
//! The session document owns players (by id) and the typed night state. Runtime
//! layers load and save it whole, and mutate it only through the engine while
//! holding the guild lock.
pub mod night;
mod player;
mod session;

pub use night::{ActionStatusEntry, NightPhase, NightState, NightStatus, swap_pair};
pub use player::{Player, PlayerId};
pub use session::{Day, GameStep, GuildId, Session};
