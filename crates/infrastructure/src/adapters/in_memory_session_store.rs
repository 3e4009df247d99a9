//! In-memory session store
//!
//! Sessions and their conversation live in one map entry, so ending a
//! session also drops its transcript. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::Arc;

use application::{error::ApplicationError, ports::SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use domain::{Conversation, Session, SessionId};
use parking_lot::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct SessionEntry {
    session: Session,
    conversation: Option<Conversation>,
}

/// Process-local session map
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> Result<(), ApplicationError> {
        debug!(session = %session.id().log_prefix(), "Session stored");
        self.entries.write().insert(
            session.id(),
            SessionEntry {
                session,
                conversation: None,
            },
        );
        Ok(())
    }

    async fn touch(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, ApplicationError> {
        let mut entries = self.entries.write();
        Ok(entries.get_mut(&id).map(|entry| {
            entry.session.touch(now);
            entry.session.clone()
        }))
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>, ApplicationError> {
        Ok(self.entries.read().get(&id).map(|e| e.session.clone()))
    }

    async fn remove(&self, id: SessionId) -> Result<Option<Session>, ApplicationError> {
        Ok(self.entries.write().remove(&id).map(|e| e.session))
    }

    async fn purge_expired(
        &self,
        idle_timeout: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<usize, ApplicationError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.session.is_expired(idle_timeout, now));
        let purged = before - entries.len();

        if purged > 0 {
            info!(purged, remaining = entries.len(), "Expired sessions purged");
        }
        Ok(purged)
    }

    async fn conversation(&self, id: SessionId) -> Result<Option<Conversation>, ApplicationError> {
        Ok(self
            .entries
            .read()
            .get(&id)
            .and_then(|e| e.conversation.clone()))
    }

    async fn save_conversation(
        &self,
        id: SessionId,
        conversation: Conversation,
    ) -> Result<(), ApplicationError> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(&id).ok_or(ApplicationError::Unauthenticated)?;
        entry.conversation = Some(conversation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use domain::{Role, User, Username};

    use super::*;

    fn session() -> Session {
        let user = User::new_local(
            Username::new("anna").unwrap(),
            "$argon2id$fake",
            Role::Patient,
            None,
            Some(Username::new("terapeut@hospital.dk").unwrap()),
        )
        .unwrap();
        Session::for_user(&user)
    }

    #[tokio::test]
    async fn insert_get_remove() {
        let store = InMemorySessionStore::new();
        let session = session();
        let id = session.id();

        store.insert(session.clone()).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), Some(session.clone()));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove(id).await.unwrap(), Some(session));
        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn touch_updates_last_seen() {
        let store = InMemorySessionStore::new();
        let session = session();
        let id = session.id();
        store.insert(session.clone()).await.unwrap();

        let later = session.last_seen_at() + TimeDelta::minutes(5);
        let touched = store.touch(id, later).await.unwrap().unwrap();

        assert_eq!(touched.last_seen_at(), later);
        assert_eq!(store.get(id).await.unwrap().unwrap().last_seen_at(), later);
        assert!(store.touch(SessionId::new(), later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_drops_only_idle_sessions() {
        let store = InMemorySessionStore::new();
        let stale = session();
        let fresh = session();
        store.insert(stale.clone()).await.unwrap();
        store.insert(fresh.clone()).await.unwrap();

        let later = stale.last_seen_at() + TimeDelta::hours(9);
        store.touch(fresh.id(), later).await.unwrap();

        let purged = store.purge_expired(TimeDelta::hours(8), later).await.unwrap();
        assert_eq!(purged, 1);
        assert!(store.get(stale.id()).await.unwrap().is_none());
        assert!(store.get(fresh.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn conversation_follows_the_session() {
        let store = InMemorySessionStore::new();
        let session = session();
        let id = session.id();
        store.insert(session).await.unwrap();
        assert!(store.conversation(id).await.unwrap().is_none());

        let mut conversation = Conversation::default();
        conversation.record_exchange("Hej", "Hej! Hvordan går det?");
        let conversation_id = conversation.id;
        store.save_conversation(id, conversation).await.unwrap();

        let stored = store.conversation(id).await.unwrap().unwrap();
        assert_eq!(stored.id, conversation_id);
        assert_eq!(stored.message_count(), 2);

        store.remove(id).await.unwrap();
        assert!(store.conversation(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saving_for_unknown_session_is_rejected() {
        let store = InMemorySessionStore::new();
        let result = store
            .save_conversation(SessionId::new(), Conversation::default())
            .await;
        assert!(matches!(result, Err(ApplicationError::Unauthenticated)));
    }
}
