//! Email address value object with validation
//!
//! Directory identities are asserted by email. The address is normalized
//! to lowercase so it can double as the directory user's username.
//!
//! # Examples
//!
//! ```
//! use domain::EmailAddress;
//!
//! let email = EmailAddress::new("Alice.Jensen@Hospital.DK").unwrap();
//! assert_eq!(email.as_str(), "alice.jensen@hospital.dk");
//! assert_eq!(email.domain(), "hospital.dk");
//! assert_eq!(email.display_name(), "Alice Jensen");
//!
//! assert!(EmailAddress::new("invalid").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;

/// A validated, lowercased email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(transparent)]
pub struct EmailAddress {
    #[validate(email)]
    value: String,
}

impl EmailAddress {
    /// Create a new email address, validating the format
    ///
    /// # Errors
    ///
    /// Returns an error if the email format is invalid.
    pub fn new(email: impl Into<String>) -> Result<Self, DomainError> {
        let value = email.into().trim().to_lowercase();

        let candidate = Self { value };
        candidate
            .validate()
            .map_err(|e| DomainError::InvalidEmailAddress(e.to_string()))?;

        Ok(candidate)
    }

    /// Get the email address as a string slice
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Get the local part (before @)
    pub fn local_part(&self) -> &str {
        self.value.split('@').next().unwrap_or("")
    }

    /// Get the domain part (after @)
    pub fn domain(&self) -> &str {
        self.value.rsplit('@').next().unwrap_or("")
    }

    /// Human-readable name derived from the local part
    ///
    /// Dots become spaces and every word is capitalized, so
    /// `anne.marie.holm@...` reads "Anne Marie Holm".
    pub fn display_name(&self) -> String {
        let words: Vec<String> = self
            .local_part()
            .split(['.', ' '])
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect();

        if words.is_empty() {
            self.value.clone()
        } else {
            words.join(" ")
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
