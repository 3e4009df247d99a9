//! Application layer - Use cases and orchestration
//!
//! Contains the authentication, conversation and roster use cases and the
//! port definitions. Orchestrates domain objects and infrastructure adapters.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
