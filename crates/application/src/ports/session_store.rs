//! Session storage port
//!
//! Sessions are ephemeral: they live for the process lifetime only.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use domain::{Conversation, Session, SessionId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for authenticated sessions and their running conversation
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new session
    async fn insert(&self, session: Session) -> Result<(), ApplicationError>;

    /// Fetch a session and mark it as seen at `now`
    async fn touch(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, ApplicationError>;

    /// Fetch a session without refreshing it
    async fn get(&self, id: SessionId) -> Result<Option<Session>, ApplicationError>;

    /// Destroy a session and its conversation
    ///
    /// Returns the removed session, if any.
    async fn remove(&self, id: SessionId) -> Result<Option<Session>, ApplicationError>;

    /// Drop sessions idle for longer than `idle_timeout`
    ///
    /// Returns the number of removed sessions.
    async fn purge_expired(
        &self,
        idle_timeout: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<usize, ApplicationError>;

    /// Conversation attached to a session
    async fn conversation(&self, id: SessionId) -> Result<Option<Conversation>, ApplicationError>;

    /// Replace the conversation attached to a session
    ///
    /// Fails with `Unauthenticated` if the session no longer exists.
    async fn save_conversation(
        &self,
        id: SessionId,
        conversation: Conversation,
    ) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn SessionStore) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SessionStore>();
    }
}
