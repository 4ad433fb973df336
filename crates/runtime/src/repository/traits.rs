//! Repository contract for saving and loading session documents.

use werewolf_core::{GuildId, Session};

use super::error::Result;

/// Persistence for one session document per guild.
///
/// Implementations only need to be atomic per call; exclusive access across
/// a load/modify/save cycle is the coordinator's job.
pub trait SessionRepository: Send + Sync {
    fn load(&self, guild_id: GuildId) -> Result<Option<Session>>;

    fn save(&self, session: &Session) -> Result<()>;

    fn exists(&self, guild_id: GuildId) -> bool {
        matches!(self.load(guild_id), Ok(Some(_)))
    }

    fn delete(&self, guild_id: GuildId) -> Result<()>;

    /// Guild ids with a stored session.
    fn list_guilds(&self) -> Result<Vec<GuildId>> {
        Ok(vec![])
    }
}
