//! The trainer's reply and the answer tiles offered to the user

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Upper bound on suggestions kept from one model reply
pub const MAX_CANDIDATES: usize = 10;

/// Text fallback tiles shown in emoji mode when the model offered no emoji
const TEXT_FALLBACK_TILES: usize = 5;

/// Reply shown when the model could not be reached
pub const DEGRADED_REPLY: &str = "Der opstod en fejl.";

/// How the answer tiles are presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// Written answer options
    Text,
    /// Pictorial options, each backed by a meaning
    #[default]
    Emoji,
}

/// One clickable answer tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTile {
    /// What the tile shows
    pub display: String,
    /// What is sent when the tile is clicked
    pub meaning: String,
}

impl CandidateTile {
    fn new(display: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            meaning: meaning.into(),
        }
    }
}

/// A parsed reply of the language trainer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub reply: String,
    pub text_suggestions: Vec<String>,
    pub emoji_suggestions: Vec<String>,
    /// Set when the reply is the fallback for an unreachable model
    #[serde(default)]
    pub degraded: bool,
}

impl AssistantTurn {
    /// Build a turn, dropping blank suggestions and keeping at most
    /// [`MAX_CANDIDATES`] of each kind in their original order
    pub fn new(
        reply: impl Into<String>,
        text_suggestions: Vec<String>,
        emoji_suggestions: Vec<String>,
    ) -> Self {
        Self {
            reply: reply.into().trim().to_string(),
            text_suggestions: clean(text_suggestions),
            emoji_suggestions: clean(emoji_suggestions),
            degraded: false,
        }
    }

    /// Fallback turn used when the model is unavailable
    pub fn degraded() -> Self {
        Self {
            reply: DEGRADED_REPLY.to_string(),
            text_suggestions: Vec::new(),
            emoji_suggestions: Vec::new(),
            degraded: true,
        }
    }

    /// Number of candidate answers offered
    pub fn candidate_count(&self) -> usize {
        self.text_suggestions.len().max(self.emoji_suggestions.len())
    }

    /// Answer tiles for the given presentation mode
    ///
    /// Emoji tiles borrow the text suggestion at the same position as
    /// their meaning. Without emoji, up to five text suggestions are shown
    /// behind a speech bubble; with nothing at all, a greeting tile.
    pub fn candidate_tiles(&self, mode: ReplyMode) -> Vec<CandidateTile> {
        if mode == ReplyMode::Text {
            return self
                .text_suggestions
                .iter()
                .map(|t| CandidateTile::new(t.clone(), t.clone()))
                .collect();
        }

        let mut tiles: Vec<CandidateTile> = self
            .emoji_suggestions
            .iter()
            .enumerate()
            .map(|(i, emoji)| {
                let meaning = self.text_suggestions.get(i).unwrap_or(emoji);
                CandidateTile::new(emoji.clone(), meaning.clone())
            })
            .collect();

        if tiles.is_empty() {
            tiles = self
                .text_suggestions
                .iter()
                .take(TEXT_FALLBACK_TILES)
                .map(|t| CandidateTile::new("🗨️", t.clone()))
                .collect();
        }
        if tiles.is_empty() {
            tiles.push(CandidateTile::new("🤝", "Hej"));
        }
        tiles
    }
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_CANDIDATES)
        .collect()
}

/// Where an utterance came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtteranceSource {
    #[default]
    TextInput,
    Speech,
    MetaButton,
    QuickOption,
}

impl UtteranceSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextInput => "text_input",
            Self::Speech => "speech",
            Self::MetaButton => "meta_button",
            Self::QuickOption => "quick_option",
        }
    }
}

impl fmt::Display for UtteranceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the user said, typed or clicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    #[serde(default)]
    pub source: UtteranceSource,
}

impl Utterance {
    /// Create an utterance, rejecting blank text
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` for empty text.
    pub fn new(text: impl Into<String>, source: UtteranceSource) -> Result<Self, DomainError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(DomainError::ValidationError(
                "utterance must not be empty".to_string(),
            ));
        }
        Ok(Self { text, source })
    }

    /// Utterance produced by one of the universal meta buttons
    pub fn meta(choice: MetaChoice) -> Self {
        Self {
            text: choice.message(),
            source: UtteranceSource::MetaButton,
        }
    }
}

/// Universal help buttons that are always available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetaChoice {
    Help,
    Confused,
    Yes,
    No,
}

impl MetaChoice {
    pub const ALL: [Self; 4] = [Self::Help, Self::Confused, Self::Yes, Self::No];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Help => "HELP",
            Self::Confused => "CONFUSED",
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Help => "🆘",
            Self::Confused => "😕",
            Self::Yes => "👍",
            Self::No => "👎",
        }
    }

    pub const fn meaning(self) -> &'static str {
        match self {
            Self::Help => "Hjælp",
            Self::Confused => "Forstår ikke",
            Self::Yes => "Ja",
            Self::No => "Nej",
        }
    }

    /// Text sent to the model, e.g. `<meta:HELP> Hjælp`
    pub fn message(self) -> String {
        format!("<meta:{}> {}", self.code(), self.meaning())
    }

    pub fn tile(self) -> CandidateTile {
        CandidateTile::new(self.emoji(), self.meaning())
    }
}

impl FromStr for MetaChoice {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::ValidationError(format!("unknown meta choice: {s}")))
    }
}
