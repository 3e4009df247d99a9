//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod activity_log;
mod database_health_port;
mod inference_port;
mod password_hasher;
mod scenario_catalog;
mod session_store;
mod speech_port;
mod transcription_port;
mod user_store;

#[cfg(test)]
pub use activity_log::MockActivityLogPort;
pub use activity_log::{ActivityCount, ActivityLogPort};
#[cfg(test)]
pub use database_health_port::MockDatabaseHealthPort;
pub use database_health_port::{DatabaseHealth, DatabaseHealthPort};
#[cfg(test)]
pub use inference_port::MockInferencePort;
pub use inference_port::{CompletionRequest, InferencePort, InferenceResult};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::PasswordHasher;
#[cfg(test)]
pub use scenario_catalog::MockScenarioCatalog;
pub use scenario_catalog::ScenarioCatalog;
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::SessionStore;
#[cfg(test)]
pub use speech_port::MockSpeechPort;
pub use speech_port::{SpeechCue, SpeechPort};
#[cfg(test)]
pub use transcription_port::MockTranscriptionPort;
pub use transcription_port::TranscriptionPort;
#[cfg(test)]
pub use user_store::MockUserStore;
pub use user_store::UserStore;
