//! Application services - use case implementations

mod bootstrap;
mod conversation_service;
mod credential_service;
mod directory_policy;
mod health_service;
mod roster_service;
mod session_service;
mod voice_service;

pub use bootstrap::{
    BootstrapAccount, BootstrapOutcome, BootstrapSeeder, DEFAULT_BOOTSTRAP_DISPLAY_NAME,
    DEFAULT_BOOTSTRAP_PASSWORD, DEFAULT_BOOTSTRAP_USERNAME,
};
pub use conversation_service::{
    ConversationOrchestrator, ConversationSettings, DEFAULT_SYSTEM_PROMPT, ScenarioSelection,
    parse_model_reply,
};
pub use credential_service::{CredentialService, NewLocalUser};
pub use directory_policy::{DirectoryPolicy, RoleOverrides};
pub use health_service::{HealthConfig, HealthReport, HealthService, ServiceHealth};
pub use roster_service::{NewPatient, ProgressReport, RosterService};
pub use session_service::{Credentials, DEFAULT_IDLE_TIMEOUT, PatientSignup, SessionResolver};
pub use voice_service::VoiceService;
