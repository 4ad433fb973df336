//! Per-guild exclusive access and phase wake-ups.
//!
//! Every session mutation runs inside [`SessionCoordinator::with_locked_session`]:
//! take the guild's mutex, load the document, run a synchronous body, save.
//! After a mutation callers [`notify`](SessionCoordinator::notify) the guild so
//! waiting phases re-check their completion predicate right away.
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace, warn};
use werewolf_core::{GuildId, Session};

use crate::api::{Result, RuntimeError};
use crate::repository::SessionRepository;

pub struct SessionCoordinator {
    repository: Arc<dyn SessionRepository>,
    locks: DashMap<GuildId, Arc<Mutex<()>>>,
    updates: broadcast::Sender<GuildId>,
}

impl SessionCoordinator {
    pub fn new(repository: Arc<dyn SessionRepository>, notify_capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(notify_capacity.max(1));
        Self {
            repository,
            locks: DashMap::new(),
            updates,
        }
    }

    pub fn repository(&self) -> &Arc<dyn SessionRepository> {
        &self.repository
    }

    fn lock_for(&self, guild_id: GuildId) -> Arc<Mutex<()>> {
        self.locks.entry(guild_id).or_default().clone()
    }

    /// Runs `body` with exclusive access to the guild's session and saves it.
    ///
    /// The session is saved even when `body` reports a domain error; the
    /// engine leaves the session untouched in that case.
    pub async fn with_locked_session<T, F>(&self, guild_id: GuildId, body: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> T + Send,
    {
        let lock = self.lock_for(guild_id);
        let _guard = lock.lock().await;

        let mut session = self
            .repository
            .load(guild_id)?
            .ok_or(RuntimeError::SessionNotFound(guild_id))?;
        let value = body(&mut session);
        self.repository.save(&session)?;
        Ok(value)
    }

    /// Stores a new session, refusing to overwrite an existing one.
    pub async fn insert_session(&self, session: Session) -> Result<()> {
        let guild_id = session.guild_id;
        let lock = self.lock_for(guild_id);
        let _guard = lock.lock().await;

        if self.repository.exists(guild_id) {
            return Err(RuntimeError::SessionExists(guild_id));
        }
        self.repository.save(&session)?;
        Ok(())
    }

    /// Snapshot of the stored session, without taking the lock.
    pub fn session(&self, guild_id: GuildId) -> Result<Session> {
        self.repository
            .load(guild_id)?
            .ok_or(RuntimeError::SessionNotFound(guild_id))
    }

    /// Wakes every waiter of `guild_id`.
    pub fn notify(&self, guild_id: GuildId) {
        if self.updates.send(guild_id).is_err() {
            trace!(target: "runtime::coordinator", guild_id, "no waiters to notify");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GuildId> {
        self.updates.subscribe()
    }

    /// Suspends until `done` holds for the guild's session or `deadline`
    /// passes.
    ///
    /// Returns `true` when the predicate held before the deadline. The
    /// predicate is re-checked on every notification for this guild; a
    /// lagged receiver counts as a notification. A missing or unreadable
    /// session counts as done so a broken document never stalls the night.
    pub async fn wait_for<F>(&self, guild_id: GuildId, deadline: Instant, mut done: F) -> bool
    where
        F: FnMut(&Session) -> bool + Send,
    {
        let mut updates = self.subscribe();
        loop {
            if self.check(guild_id, &mut done) {
                return true;
            }
            loop {
                match timeout_at(deadline, updates.recv()).await {
                    Err(_) => {
                        debug!(target: "runtime::coordinator", guild_id, "wait deadline reached");
                        return false;
                    }
                    Ok(Ok(id)) if id == guild_id => break,
                    Ok(Ok(_)) => continue,
                    Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                        trace!(target: "runtime::coordinator", guild_id, skipped, "notify lagged");
                        break;
                    }
                    Ok(Err(broadcast::error::RecvError::Closed)) => {
                        tokio::time::sleep_until(deadline).await;
                        return self.check(guild_id, &mut done);
                    }
                }
            }
        }
    }

    fn check<F>(&self, guild_id: GuildId, done: &mut F) -> bool
    where
        F: FnMut(&Session) -> bool,
    {
        match self.repository.load(guild_id) {
            Ok(Some(session)) => done(&session),
            Ok(None) => {
                warn!(target: "runtime::coordinator", guild_id, "session vanished while waiting");
                true
            }
            Err(error) => {
                warn!(target: "runtime::coordinator", guild_id, %error, "session unreadable while waiting");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemorySessionRepository;
    use std::time::Duration;
    use werewolf_core::GameStep;

    fn create_test_coordinator() -> Arc<SessionCoordinator> {
        let repo = Arc::new(InMemorySessionRepository::new());
        repo.save(&Session::new(1, 0)).unwrap();
        repo.save(&Session::new(2, 0)).unwrap();
        Arc::new(SessionCoordinator::new(repo, 16))
    }

    #[tokio::test]
    async fn locked_body_changes_are_saved() {
        let coordinator = create_test_coordinator();

        let day = coordinator
            .with_locked_session(1, |session| {
                session.day = 4;
                session.day
            })
            .await
            .unwrap();

        assert_eq!(day, 4);
        assert_eq!(coordinator.session(1).unwrap().day, 4);
        assert!(matches!(
            coordinator.with_locked_session(9, |_| ()).await,
            Err(RuntimeError::SessionNotFound(9))
        ));
    }

    #[tokio::test]
    async fn concurrent_bodies_never_lose_updates() {
        let coordinator = create_test_coordinator();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let coordinator = Arc::clone(&coordinator);
            handles.push(tokio::spawn(async move {
                coordinator
                    .with_locked_session(1, |session| session.rng_nonce += 1)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(coordinator.session(1).unwrap().rng_nonce, 20);
    }

    #[tokio::test]
    async fn notification_wakes_the_waiter_early() {
        let coordinator = create_test_coordinator();
        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                let deadline = Instant::now() + Duration::from_secs(5);
                coordinator
                    .wait_for(1, deadline, |session| session.step == GameStep::Night)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator
            .with_locked_session(1, |session| session.step = GameStep::Night)
            .await
            .unwrap();
        coordinator.notify(1);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn wait_times_out_and_ignores_other_guilds() {
        let coordinator = create_test_coordinator();
        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                let deadline = Instant::now() + Duration::from_millis(80);
                coordinator
                    .wait_for(1, deadline, |session| session.step == GameStep::Night)
                    .await
            })
        };

        coordinator
            .with_locked_session(2, |session| session.step = GameStep::Night)
            .await
            .unwrap();
        coordinator.notify(2);

        assert!(!waiter.await.unwrap());
    }
}
