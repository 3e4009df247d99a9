//! Application state shared across handlers

use std::sync::Arc;

use application::{
    ApplicationError, BootstrapSeeder, ConversationOrchestrator, CredentialService, HealthService,
    RosterService, SessionResolver, VoiceService,
    ports::{
        ActivityLogPort, DatabaseHealthPort, InferencePort, PasswordHasher, ScenarioCatalog,
        SessionStore, SpeechPort, TranscriptionPort, UserStore,
    },
};
use infrastructure::AppConfig;

use crate::middleware::RateLimiterState;

/// The adapters behind every port
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub sessions: Arc<dyn SessionStore>,
    pub activity: Arc<dyn ActivityLogPort>,
    pub inference: Arc<dyn InferencePort>,
    pub transcription: Arc<dyn TranscriptionPort>,
    pub speech: Arc<dyn SpeechPort>,
    pub scenarios: Arc<dyn ScenarioCatalog>,
    pub database: Arc<dyn DatabaseHealthPort>,
}

impl std::fmt::Debug for Ports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ports").finish_non_exhaustive()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionResolver>,
    pub credentials: Arc<CredentialService>,
    pub conversation: Arc<ConversationOrchestrator>,
    pub roster: Arc<RosterService>,
    pub voice: Arc<VoiceService>,
    pub scenarios: Arc<dyn ScenarioCatalog>,
    pub health: Arc<HealthService>,
    pub bootstrap: Arc<BootstrapSeeder>,
    /// Buckets of the sign-in rate limiter, shared with the cleanup task
    pub auth_limiter: Arc<RateLimiterState>,
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("conversation", &self.conversation)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the services from their ports and the loaded configuration
    ///
    /// # Errors
    ///
    /// `Configuration` when the staff directory settings are unusable.
    pub fn new(ports: Ports, config: AppConfig) -> Result<Self, ApplicationError> {
        let credentials = Arc::new(CredentialService::new(
            Arc::clone(&ports.users),
            Arc::clone(&ports.hasher),
        ));

        let sessions = SessionResolver::new(
            Arc::clone(&credentials),
            config.directory.policy()?,
            Arc::clone(&ports.users),
            Arc::clone(&ports.sessions),
            Arc::clone(&ports.activity),
        )
        .with_idle_timeout(config.session.idle_timeout());

        let conversation = ConversationOrchestrator::new(
            Arc::clone(&ports.inference),
            Arc::clone(&ports.sessions),
            Arc::clone(&ports.scenarios),
            Arc::clone(&ports.activity),
            config
                .scenarios
                .conversation_settings(config.inference.temperature, config.inference.max_tokens),
        );

        let health = HealthService::new(
            Arc::clone(&ports.database),
            Arc::clone(&ports.inference),
            Arc::clone(&ports.transcription),
            Arc::clone(&ports.speech),
        )
        .with_config(config.health.clone());

        let bootstrap = BootstrapSeeder::new(
            Arc::clone(&ports.users),
            Arc::clone(&credentials),
            config.bootstrap.account(),
        );

        Ok(Self {
            sessions: Arc::new(sessions),
            conversation: Arc::new(conversation),
            roster: Arc::new(RosterService::new(
                Arc::clone(&ports.users),
                Arc::clone(&ports.activity),
                Arc::clone(&credentials),
            )),
            voice: Arc::new(VoiceService::new(ports.transcription, ports.speech)),
            scenarios: ports.scenarios,
            health: Arc::new(health),
            bootstrap: Arc::new(bootstrap),
            auth_limiter: Arc::new(RateLimiterState::new(config.server.auth_rate_limit_rpm)),
            credentials,
            config: Arc::new(config),
        })
    }
}
