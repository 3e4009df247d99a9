//! Authenticated session entity

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::User;
use crate::value_objects::{AuthMethod, Permission, Role, SessionId, Username};

/// An authenticated browser session
///
/// The role is copied from the user at authentication time and cannot be
/// changed afterwards; a role change takes effect at the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    id: SessionId,
    username: Username,
    display_name: String,
    role: Role,
    auth_method: AuthMethod,
    created_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
}

impl Session {
    /// Open a new session for an authenticated user
    pub fn for_user(user: &User) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            username: user.username().clone(),
            display_name: user.display_name().to_string(),
            role: user.role(),
            auth_method: user.auth_method(),
            created_at: now,
            last_seen_at: now,
        }
    }

    pub const fn id(&self) -> SessionId {
        self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub const fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn last_seen_at(&self) -> DateTime<Utc> {
        self.last_seen_at
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Whether the session has been idle longer than `idle_timeout`
    pub fn is_expired(&self, idle_timeout: TimeDelta, now: DateTime<Utc>) -> bool {
        now - self.last_seen_at > idle_timeout
    }

    /// Record activity
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_seen_at {
            self.last_seen_at = now;
        }
    }
}
