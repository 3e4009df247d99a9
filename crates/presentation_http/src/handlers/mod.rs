//! HTTP request handlers

pub mod auth;
pub mod conversation;
pub mod health;
pub mod roster;
pub mod scenarios;
pub mod voice;
