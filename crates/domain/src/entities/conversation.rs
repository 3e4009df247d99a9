//! Conversation entity - the running history of one practice session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, MessageRole, Scenario};
use crate::value_objects::ConversationId;

/// Ordered message history of a practice conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier
    pub id: ConversationId,
    /// Scenario the conversation practises, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    /// Ad-hoc scenario written for this conversation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_scenario: Option<Scenario>,
    /// Messages in the conversation (oldest first)
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation
    pub fn new(scenario_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            scenario_id,
            custom_scenario: None,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation that practises an ad-hoc scenario
    pub fn with_custom_scenario(scenario: Scenario) -> Self {
        Self {
            custom_scenario: Some(scenario),
            ..Self::new(None)
        }
    }

    /// Append one exchange: the user utterance followed by the reply
    pub fn record_exchange(&mut self, utterance: impl Into<String>, reply: impl Into<String>) {
        self.messages.push(ChatMessage::user(utterance));
        self.messages.push(ChatMessage::assistant(reply));
        self.updated_at = Utc::now();
    }

    /// Get the last message in the conversation
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Get the last assistant reply
    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Get the number of messages
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Check if the conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(None)
    }
}
