//! Roleplay scenario entity

use serde::{Deserialize, Serialize};

/// Marker sent to the model to open a conversation without a scripted line
pub const SESSION_START_MARKER: &str = "<session_start>";

/// Id given to scenarios written by staff on the spot
pub const CUSTOM_SCENARIO_ID: &str = "custom";

/// Title used when an ad-hoc scenario is submitted without one
pub const DEFAULT_CUSTOM_TITLE: &str = "Mit ad-hoc scenarie";

/// A scripted everyday situation to practise (shopping, ordering coffee, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier, the file stem of the scenario definition
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Extra instructions appended to the base system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_addition: Option<String>,
    /// Scripted opening line sent on behalf of the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Scenario {
    /// An ad-hoc scenario that exists only for one conversation
    ///
    /// Fields are trimmed; a blank title falls back to a default.
    pub fn custom(
        title: Option<String>,
        description: Option<String>,
        system_prompt_addition: Option<String>,
        first_message: Option<String>,
    ) -> Self {
        Self {
            id: CUSTOM_SCENARIO_ID.to_string(),
            title: non_blank(title).unwrap_or_else(|| DEFAULT_CUSTOM_TITLE.to_string()),
            description: non_blank(description).unwrap_or_default(),
            system_prompt_addition: non_blank(system_prompt_addition),
            first_message: non_blank(first_message),
        }
    }

    /// The utterance that opens a conversation in this scenario
    pub fn opening_utterance(&self) -> &str {
        self.first_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(SESSION_START_MARKER)
    }

    /// Base prompt extended with this scenario's instructions
    pub fn compose_system_prompt(&self, base: &str) -> String {
        match self
            .system_prompt_addition
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
        {
            Some(addition) => format!("{base}\n\n{addition}"),
            None => base.to_string(),
        }
    }
}
