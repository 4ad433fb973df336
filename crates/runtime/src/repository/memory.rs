use std::collections::HashMap;
use std::sync::RwLock;

use werewolf_core::{GuildId, Session};

use super::SessionRepository;
use super::error::{RepositoryError, Result};

/// In-memory implementation of [`SessionRepository`].
///
/// Sessions are stored as JSON documents, so every load hands out an
/// independent copy and the stored shape stays plain data.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    documents: RwLock<HashMap<GuildId, String>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document, for inspection.
    pub fn document(&self, guild_id: GuildId) -> Result<Option<String>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(documents.get(&guild_id).cloned())
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn load(&self, guild_id: GuildId) -> Result<Option<Session>> {
        let Some(document) = self.document(guild_id)? else {
            return Ok(None);
        };
        serde_json::from_str(&document)
            .map(Some)
            .map_err(|e| RepositoryError::CorruptedData {
                guild_id,
                reason: e.to_string(),
            })
    }

    fn save(&self, session: &Session) -> Result<()> {
        let document =
            serde_json::to_string(session).map_err(|e| RepositoryError::Json(e.to_string()))?;
        let mut documents = self
            .documents
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        documents.insert(session.guild_id, document);
        Ok(())
    }

    fn exists(&self, guild_id: GuildId) -> bool {
        self.documents
            .read()
            .is_ok_and(|documents| documents.contains_key(&guild_id))
    }

    fn delete(&self, guild_id: GuildId) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        documents.remove(&guild_id);
        Ok(())
    }

    fn list_guilds(&self) -> Result<Vec<GuildId>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut guilds: Vec<GuildId> = documents.keys().copied().collect();
        guilds.sort_unstable();
        Ok(guilds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use werewolf_core::{ActionId, Player, Role};

    #[test]
    fn session_document_survives_a_round_trip() {
        let repo = InMemorySessionRepository::new();
        let mut session = Session::new(7, 99).with_players([
            Player::new(1, [Role::Werewolf]),
            Player::new(2, [Role::Witch]),
        ]);
        session.night.record_usage(2, ActionId::WitchPoison);
        session.night.fear_targets.insert(1, 2);

        repo.save(&session).unwrap();

        assert_eq!(repo.load(7).unwrap(), Some(session));
        assert_eq!(repo.list_guilds().unwrap(), vec![7]);
    }

    #[test]
    fn missing_and_deleted_sessions_load_as_none() {
        let repo = InMemorySessionRepository::new();
        assert_eq!(repo.load(1).unwrap(), None);

        repo.save(&Session::new(1, 0)).unwrap();
        assert!(repo.exists(1));
        repo.delete(1).unwrap();
        assert!(!repo.exists(1));
    }
}
