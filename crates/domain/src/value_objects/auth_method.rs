//! How a user proves their identity

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Authentication method of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Username and password held in the local credential store
    Local,
    /// Identity asserted by the upstream single-sign-on directory
    Directory,
}

impl AuthMethod {
    /// Identifier used in the `auth_source` column
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Directory => "sso",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

impl FromStr for AuthMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "sso" | "directory" => Ok(Self::Directory),
            other => Err(DomainError::ValidationError(format!(
                "unknown auth method: {other}"
            ))),
        }
    }
}
