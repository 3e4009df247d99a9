//! Conversation handlers
//!
//! Every turn comes back with the tiles for the requested reply mode so the
//! client never has to pair emoji and meanings itself.

use axum::{Json, body::Bytes, extract::State};
use application::ScenarioSelection;
use domain::{
    AssistantTurn, CandidateTile, MetaChoice, Permission, ReplyMode, Scenario, Utterance,
    UtteranceSource,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, middleware::CurrentSession, state::AppState};

/// Ad-hoc scenario written by staff; needs `create_roleplay`
#[derive(Debug, Default, Deserialize)]
pub struct CustomScenarioRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt_addition: Option<String>,
    #[serde(default)]
    pub first_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub scenario_id: Option<String>,
    #[serde(default)]
    pub custom_scenario: Option<CustomScenarioRequest>,
    #[serde(default)]
    pub mode: ReplyMode,
}

impl StartRequest {
    /// An empty body starts a free conversation
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
    }

    fn selection(self) -> Result<ScenarioSelection, ApiError> {
        match self.custom_scenario {
            Some(_) if self.scenario_id.is_some() => Err(ApiError::BadRequest(
                "scenario_id and custom_scenario are mutually exclusive".to_string(),
            )),
            Some(custom) => Ok(ScenarioSelection::Custom(Scenario::custom(
                custom.title,
                custom.description,
                custom.system_prompt_addition,
                custom.first_message,
            ))),
            None => Ok(ScenarioSelection::from_id(self.scenario_id.as_deref())),
        }
    }
}

/// A user turn; `choice` sends one of the meta buttons instead of `text`
#[derive(Debug, Default, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source: UtteranceSource,
    #[serde(default)]
    pub mode: ReplyMode,
    #[serde(default)]
    pub choice: Option<String>,
}

impl MessageRequest {
    fn utterance(&self) -> Result<Utterance, ApiError> {
        match self.choice.as_deref() {
            Some(code) => {
                let choice: MetaChoice = code
                    .parse()
                    .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))?;
                Ok(Utterance::meta(choice))
            },
            None => Utterance::new(self.text.clone(), self.source)
                .map_err(|e| ApiError::BadRequest(e.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub reply: String,
    pub degraded: bool,
    pub mode: ReplyMode,
    pub tiles: Vec<CandidateTile>,
    pub text_suggestions: Vec<String>,
    pub emoji_suggestions: Vec<String>,
}

impl TurnResponse {
    pub fn new(turn: AssistantTurn, mode: ReplyMode) -> Self {
        Self {
            tiles: turn.candidate_tiles(mode),
            reply: turn.reply,
            degraded: turn.degraded,
            mode,
            text_suggestions: turn.text_suggestions,
            emoji_suggestions: turn.emoji_suggestions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChoiceView {
    pub code: &'static str,
    pub emoji: &'static str,
    pub meaning: &'static str,
}

/// Start (or restart) the conversation, optionally inside a scenario
pub async fn start(
    State(state): State<AppState>,
    current: CurrentSession,
    body: Bytes,
) -> Result<Json<TurnResponse>, ApiError> {
    let session = current.require(Permission::UseProgram)?;
    let request = StartRequest::parse(&body)?;
    let mode = request.mode;

    let turn = state
        .conversation
        .start(session, request.selection()?)
        .await?;

    Ok(Json(TurnResponse::new(turn, mode)))
}

pub async fn message(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(request): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let session = current.require(Permission::UseProgram)?;
    let utterance = request.utterance()?;

    let turn = state.conversation.respond(session, utterance).await?;
    Ok(Json(TurnResponse::new(turn, request.mode)))
}

/// The universal help buttons
pub async fn choices(_current: CurrentSession) -> Json<Vec<ChoiceView>> {
    Json(
        MetaChoice::ALL
            .into_iter()
            .map(|c| ChoiceView {
                code: c.code(),
                emoji: c.emoji(),
                meaning: c.meaning(),
            })
            .collect(),
    )
}
