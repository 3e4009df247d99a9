//! Transcription and read-aloud handlers

use application::ports::SpeechCue;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ApiError, middleware::CurrentSession, state::AppState};

/// Latest transcript; `available` is false when the service is down
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TranscriptView {
    pub text: Option<String>,
    pub available: bool,
}

impl TranscriptView {
    fn from_result<E: std::fmt::Display>(result: Result<Option<String>, E>) -> Self {
        match result {
            Ok(text) => Self {
                text,
                available: true,
            },
            Err(e) => {
                debug!(error = %e, "Transcription unavailable");
                Self {
                    text: None,
                    available: false,
                }
            },
        }
    }
}

pub async fn final_transcript(
    State(state): State<AppState>,
    _current: CurrentSession,
) -> Json<TranscriptView> {
    Json(TranscriptView::from_result(state.voice.latest_final().await))
}

pub async fn partial_transcript(
    State(state): State<AppState>,
    _current: CurrentSession,
) -> Json<TranscriptView> {
    Json(TranscriptView::from_result(state.voice.latest_partial().await))
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub cue: Option<SpeechCue>,
}

/// Turn a text into a read-aloud cue
pub async fn speak(
    State(state): State<AppState>,
    _current: CurrentSession,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, ApiError> {
    let cue = state.voice.read_aloud(&request.text).await?;
    Ok(Json(SpeakResponse { cue }))
}

#[derive(Debug, Deserialize)]
pub struct TtsQuery {
    #[serde(default)]
    pub text: String,
}

/// Hover read-aloud hook; only acknowledges for now
pub async fn tts_placeholder(Query(query): Query<TtsQuery>) -> &'static str {
    debug!(text_len = query.text.len(), "Read-aloud requested");
    "ok"
}
