//! Identifier of one practice conversation

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-ordered identifier of a practice conversation
///
/// A new one is issued every time a conversation is (re)started, so
/// activity events of separate runs can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    /// Create a new time-ordered conversation ID
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a conversation ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the underlying UUID
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
