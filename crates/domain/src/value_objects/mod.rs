//! Value Objects - Immutable, identity-less domain primitives

mod auth_method;
mod conversation_id;
mod email_address;
mod role;
mod session_id;
mod username;

pub use auth_method::AuthMethod;
pub use conversation_id::ConversationId;
pub use email_address::EmailAddress;
pub use role::{Permission, Role};
pub use session_id::SessionId;
pub use username::{MAX_USERNAME_LENGTH, Username};
