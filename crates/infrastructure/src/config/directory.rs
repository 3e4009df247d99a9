//! Directory (SSO) policy configuration.

use application::{ApplicationError, DirectoryPolicy, RoleOverrides};
use domain::Role;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Staff email domain allow-list
pub const EMAIL_DOMAIN_VAR: &str = "STAFF_EMAIL_DOMAIN";
/// JSON object mapping staff emails to roles
pub const ROLE_OVERRIDES_VAR: &str = "STAFF_ROLE_OVERRIDES_JSON";

/// Directory sign-in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Only emails in this domain may sign in (empty = any domain)
    #[serde(default)]
    pub email_domain: Option<String>,

    /// JSON object `{"email": "role"}`; invalid JSON is ignored
    #[serde(default)]
    pub role_overrides_json: Option<String>,

    /// Role given to staff without an override or valid request
    #[serde(default = "default_role")]
    pub default_role: Role,
}

const fn default_role() -> Role {
    Role::Therapist
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            email_domain: None,
            role_overrides_json: None,
            default_role: default_role(),
        }
    }
}

impl DirectoryConfig {
    /// Apply `STAFF_EMAIL_DOMAIN` and `STAFF_ROLE_OVERRIDES_JSON` from the environment
    #[must_use]
    pub fn from_env(self) -> Self {
        self.with_lookup(|name| std::env::var(name).ok())
    }

    /// Apply the staff variables using the given lookup
    #[must_use]
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(domain) = lookup(EMAIL_DOMAIN_VAR) {
            self.email_domain = Some(domain);
        }
        if let Some(raw) = lookup(ROLE_OVERRIDES_VAR) {
            self.role_overrides_json = Some(raw);
        }
        self
    }

    /// Build the policy used by the session resolver
    ///
    /// # Errors
    ///
    /// Fails when `default_role` is not a staff role.
    pub fn policy(&self) -> Result<DirectoryPolicy, ApplicationError> {
        let overrides = self
            .role_overrides_json
            .as_deref()
            .map(RoleOverrides::from_json)
            .unwrap_or_default();

        if self.role_overrides_json.as_deref().is_some_and(|raw| !raw.trim().is_empty())
            && overrides.is_empty()
        {
            warn!("Staff role overrides are empty or invalid; no overrides apply");
        }

        DirectoryPolicy::new(self.email_domain.as_deref(), overrides, self.default_role)
    }
}
