//! Conversation orchestrator - the roleplay loop
//!
//! Every utterance is sent with the full conversation history to the
//! language model, which answers with a short reply and a set of candidate
//! answers the user can pick from.

use std::{fmt, sync::Arc};

use domain::{
    ActivityEvent, AssistantTurn, Conversation, Permission, SESSION_START_MARKER, Scenario,
    Session, Utterance,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{ActivityLogPort, CompletionRequest, InferencePort, ScenarioCatalog, SessionStore},
};

/// Base instructions for the language trainer
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"Du er en venlig dansk sprogtræner, der hjælper personer med afasi med at øve hverdagssamtaler.

Hvis samtalen ikke fungerer for brugeren, må du træde ud af rollen og i stedet hjælpe som sprogterapeut.

Begynd så enkelt som muligt. Øg sværhedsgraden i spørgsmål og svarmuligheder, når brugeren klarer sig godt.

Tal i korte, tydelige sætninger og gentag nøgleord. Svar altid på dansk.

Når du modtager "<session_start>", så begynd samtalen med en venlig hilsen og 3-5 helt enkle svarmuligheder.

Reagér som sprogtræner i stedet for at fortsætte scenariet, når brugeren vælger:
- "Hjælp" eller meta:HELP: forklar kort, hvad brugeren kan sige.
- "Forstår ikke" eller meta:CONFUSED: gentag sidste sætning langsommere og enklere.
- "Ja" eller meta:YES: bekræft venligt, evt. med et enkelt opfølgende spørgsmål.
- "Nej" eller meta:NO: anerkend svaret og tilbyd et alternativ.

Når samtalen er slut, så giv en kort vurdering af, hvordan det gik, og hvilket niveau brugeren er klar til næste gang.

Returnér ALTID gyldig JSON med denne struktur og intet andet:
{
"assistant_reply": "<din korte sætning>",
"text_suggestions": ["mulighed 1", "mulighed 2"],
"emoji_suggestions": ["emoji1", "emoji2"]
}

Krav:
- `assistant_reply` er højst 1-2 korte sætninger.
- `text_suggestions` er 3-8 korte danske muligheder.
- `emoji_suggestions` har samme længde og rækkefølge som text_suggestions.
- Brug "🗨️" når en mulighed ikke har en naturlig emoji.
- Hold en støttende, rolig tone."#;

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 400;

/// Model parameters for the trainer
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Shape the model is asked to answer with
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelReply {
    assistant_reply: String,
    text_suggestions: Vec<serde_json::Value>,
    emoji_suggestions: Vec<serde_json::Value>,
}

/// Parse the model output into a turn
///
/// Code fences around the JSON are tolerated. Output that is not a JSON
/// object becomes the reply itself, without candidates. Suggestions that
/// are not strings are skipped.
pub fn parse_model_reply(raw: &str) -> AssistantTurn {
    let body = strip_code_fence(raw);

    match serde_json::from_str::<ModelReply>(body) {
        Ok(reply) => AssistantTurn::new(
            reply.assistant_reply,
            strings(reply.text_suggestions),
            strings(reply.emoji_suggestions),
        ),
        Err(e) => {
            debug!(error = %e, "Model reply is not JSON, using raw text");
            AssistantTurn::new(raw, Vec::new(), Vec::new())
        },
    }
}

fn strings(values: Vec<serde_json::Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// What a new conversation practises
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScenarioSelection {
    /// No scenario, the trainer opens freely
    #[default]
    Free,
    /// A scenario from the catalog, by id
    Catalog(String),
    /// An ad-hoc scenario written by staff
    Custom(Scenario),
}

impl ScenarioSelection {
    /// Catalog selection from an optional id; blank ids mean no scenario
    pub fn from_id(id: Option<&str>) -> Self {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::Catalog(id.to_string()),
            None => Self::Free,
        }
    }
}

/// Drives a practice conversation for one session
pub struct ConversationOrchestrator {
    inference: Arc<dyn InferencePort>,
    sessions: Arc<dyn SessionStore>,
    scenarios: Arc<dyn ScenarioCatalog>,
    activity: Arc<dyn ActivityLogPort>,
    settings: ConversationSettings,
}

impl fmt::Debug for ConversationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationOrchestrator")
            .field("temperature", &self.settings.temperature)
            .field("max_tokens", &self.settings.max_tokens)
            .finish_non_exhaustive()
    }
}

impl ConversationOrchestrator {
    pub fn new(
        inference: Arc<dyn InferencePort>,
        sessions: Arc<dyn SessionStore>,
        scenarios: Arc<dyn ScenarioCatalog>,
        activity: Arc<dyn ActivityLogPort>,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            inference,
            sessions,
            scenarios,
            activity,
            settings,
        }
    }

    pub const fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    /// Reset the conversation and let the trainer open it
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown scenario id, `Forbidden` for an ad-hoc
    /// scenario without `create_roleplay`, `Unauthenticated` when the
    /// session vanished meanwhile.
    #[instrument(skip(self, session, selection), fields(username = %session.username()))]
    pub async fn start(
        &self,
        session: &Session,
        selection: ScenarioSelection,
    ) -> Result<AssistantTurn, ApplicationError> {
        let (conversation, scenario) = match selection {
            ScenarioSelection::Free => (Conversation::new(None), None),
            ScenarioSelection::Catalog(id) => {
                let scenario = self
                    .scenarios
                    .get(&id)
                    .await?
                    .ok_or_else(|| ApplicationError::NotFound(format!("scenario {id}")))?;
                (Conversation::new(Some(scenario.id.clone())), Some(scenario))
            },
            ScenarioSelection::Custom(scenario) => {
                if !session.has_permission(Permission::CreateRoleplay) {
                    return Err(ApplicationError::Forbidden(
                        Permission::CreateRoleplay.as_str().to_string(),
                    ));
                }
                (
                    Conversation::with_custom_scenario(scenario.clone()),
                    Some(scenario),
                )
            },
        };

        self.sessions
            .save_conversation(session.id(), conversation.clone())
            .await?;

        self.record(ActivityEvent::session_start(
            session.username().clone(),
            scenario.as_ref().map(|s| s.id.as_str()),
        ))
        .await;

        let opening = scenario
            .as_ref()
            .map_or(SESSION_START_MARKER, Scenario::opening_utterance)
            .to_string();
        info!(scenario = ?scenario.as_ref().map(|s| &s.id), "Conversation started");

        self.exchange(session, conversation, scenario.as_ref(), &opening)
            .await
    }

    /// Send a user utterance and return the trainer's turn
    ///
    /// An unreachable model yields a degraded turn; the utterance is then
    /// not added to the history.
    #[instrument(skip(self, session, utterance), fields(username = %session.username(), source = utterance.source.as_str()))]
    pub async fn respond(
        &self,
        session: &Session,
        utterance: Utterance,
    ) -> Result<AssistantTurn, ApplicationError> {
        let conversation = self
            .sessions
            .conversation(session.id())
            .await?
            .unwrap_or_default();

        let scenario = match (&conversation.custom_scenario, conversation.scenario_id.as_deref()) {
            (Some(custom), _) => Some(custom.clone()),
            (None, Some(id)) => self.scenarios.get(id).await?,
            (None, None) => None,
        };

        self.record(ActivityEvent::user_message(
            session.username().clone(),
            &utterance.text,
            utterance.source.as_str(),
        ))
        .await;

        self.exchange(session, conversation, scenario.as_ref(), &utterance.text)
            .await
    }

    async fn exchange(
        &self,
        session: &Session,
        mut conversation: Conversation,
        scenario: Option<&Scenario>,
        user_input: &str,
    ) -> Result<AssistantTurn, ApplicationError> {
        let system_prompt = scenario.map_or_else(
            || self.settings.system_prompt.clone(),
            |s| s.compose_system_prompt(&self.settings.system_prompt),
        );

        let request = CompletionRequest {
            system_prompt,
            history: conversation.messages.clone(),
            user_input: user_input.to_string(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            json_output: true,
        };

        let result = match self.inference.complete(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Inference failed, returning degraded turn");
                return Ok(AssistantTurn::degraded());
            },
        };

        let turn = parse_model_reply(&result.content);
        debug!(
            model = %result.model,
            latency_ms = result.latency_ms,
            candidates = turn.candidate_count(),
            "Trainer replied"
        );

        conversation.record_exchange(user_input, turn.reply.clone());
        self.sessions
            .save_conversation(session.id(), conversation)
            .await?;

        self.record(ActivityEvent::assistant_reply(
            session.username().clone(),
            &turn.reply,
            turn.candidate_count(),
        ))
        .await;

        Ok(turn)
    }

    async fn record(&self, event: ActivityEvent) {
        if let Err(e) = self.activity.record(&event).await {
            warn!(error = %e, event = event.event_type.as_str(), "Failed to record activity");
        }
    }
}
