//! Domain entities - Objects with identity and lifecycle

mod activity_event;
mod assistant_turn;
mod chat_message;
mod conversation;
mod scenario;
mod session;
mod user;

pub use activity_event::{ActivityEvent, ActivityEventType};
pub use assistant_turn::{
    AssistantTurn, CandidateTile, DEGRADED_REPLY, MAX_CANDIDATES, MetaChoice, ReplyMode,
    Utterance, UtteranceSource,
};
pub use chat_message::{ChatMessage, MessageRole};
pub use conversation::Conversation;
pub use scenario::{CUSTOM_SCENARIO_ID, DEFAULT_CUSTOM_TITLE, SESSION_START_MARKER, Scenario};
pub use session::Session;
pub use user::{MIN_PASSWORD_LENGTH, User, UserCredential, check_password_policy};
