//! Domain layer for the aphasia conversation trainer
//!
//! Contains users, roles, sessions, scenarios and conversation turns.
//! This layer has no I/O and defines the ubiquitous language.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
