//! First-start developer account configuration.

use application::{
    BootstrapAccount, DEFAULT_BOOTSTRAP_DISPLAY_NAME, DEFAULT_BOOTSTRAP_PASSWORD,
    DEFAULT_BOOTSTRAP_USERNAME,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::default_true;

/// Bootstrap seeder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Seed the developer account on an empty store
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_username")]
    pub username: String,

    /// Initial password (never serialized)
    #[serde(default = "default_password", skip_serializing)]
    pub password: SecretString,

    #[serde(default = "default_display_name")]
    pub display_name: String,
}

fn default_username() -> String {
    DEFAULT_BOOTSTRAP_USERNAME.to_string()
}

fn default_password() -> SecretString {
    SecretString::from(DEFAULT_BOOTSTRAP_PASSWORD.to_string())
}

fn default_display_name() -> String {
    DEFAULT_BOOTSTRAP_DISPLAY_NAME.to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            username: default_username(),
            password: default_password(),
            display_name: default_display_name(),
        }
    }
}

impl BootstrapConfig {
    pub fn account(&self) -> BootstrapAccount {
        BootstrapAccount {
            username: self.username.clone(),
            password: self.password.clone(),
            display_name: self.display_name.clone(),
        }
    }
}
