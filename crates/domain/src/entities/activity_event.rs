//! Activity log entry - what a user did, for progress tracking

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{errors::DomainError, value_objects::Username};

/// Type of activity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventType {
    /// A practice conversation was (re)started
    SessionStart,
    /// The user said, typed or clicked something
    UserMessage,
    /// The trainer replied
    AssistantReply,
    /// Successful sign-in
    Login,
    /// Explicit sign-out
    Logout,
}

impl ActivityEventType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::UserMessage => "user_message",
            Self::AssistantReply => "assistant_reply",
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }
}

impl fmt::Display for ActivityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityEventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_start" => Ok(Self::SessionStart),
            "user_message" => Ok(Self::UserMessage),
            "assistant_reply" => Ok(Self::AssistantReply),
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            other => Err(DomainError::ValidationError(format!(
                "unknown activity event type: {other}"
            ))),
        }
    }
}

/// A single recorded activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub username: Username,
    pub event_type: ActivityEventType,
    /// Event-specific details as a JSON object
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEvent {
    /// Create an event with an empty payload
    pub fn new(username: Username, event_type: ActivityEventType) -> Self {
        Self {
            id: Uuid::now_v7(),
            username,
            event_type,
            payload: json!({}),
            created_at: Utc::now(),
        }
    }

    /// Set the payload
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// A conversation was started, optionally in a scenario
    pub fn session_start(username: Username, scenario_id: Option<&str>) -> Self {
        Self::new(username, ActivityEventType::SessionStart)
            .with_payload(json!({ "scenario": scenario_id }))
    }

    /// The user produced an utterance from the given input source
    pub fn user_message(username: Username, text: &str, source: &str) -> Self {
        Self::new(username, ActivityEventType::UserMessage)
            .with_payload(json!({ "text": text, "source": source }))
    }

    /// The trainer replied and offered `options` candidate answers
    pub fn assistant_reply(username: Username, reply: &str, options: usize) -> Self {
        Self::new(username, ActivityEventType::AssistantReply)
            .with_payload(json!({ "text": reply, "options": options }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anna() -> Username {
        Username::new("anna").unwrap()
    }

    #[test]
    fn event_type_roundtrips_through_str() {
        for t in [
            ActivityEventType::SessionStart,
            ActivityEventType::UserMessage,
            ActivityEventType::AssistantReply,
            ActivityEventType::Login,
            ActivityEventType::Logout,
        ] {
            assert_eq!(t.as_str().parse::<ActivityEventType>().unwrap(), t);
        }
        assert!("deleted".parse::<ActivityEventType>().is_err());
    }

    #[test]
    fn user_message_payload_has_source() {
        let event = ActivityEvent::user_message(anna(), "Ja", "meta_button");
        assert_eq!(event.event_type, ActivityEventType::UserMessage);
        assert_eq!(event.payload["text"], "Ja");
        assert_eq!(event.payload["source"], "meta_button");
    }

    #[test]
    fn session_start_payload_allows_no_scenario() {
        let event = ActivityEvent::session_start(anna(), None);
        assert!(event.payload["scenario"].is_null());
    }

    #[test]
    fn default_payload_is_empty_object() {
        let event = ActivityEvent::new(anna(), ActivityEventType::Login);
        assert_eq!(event.payload, json!({}));
    }
}
