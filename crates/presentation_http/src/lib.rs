//! HTTP presentation layer of the aphasia conversation trainer
//!
//! JSON API for sign-in, practice conversations, voice helpers and the
//! staff roster.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod tasks;

pub use error::ApiError;
pub use middleware::{CurrentSession, RateLimiterConfig, RateLimiterLayer, RateLimiterState};
pub use routes::create_router;
pub use state::{AppState, Ports};
