//! Username value object
//!
//! Usernames are the primary key of a user record. Local usernames are
//! chosen at signup, directory usernames are the lowercased email. A local
//! name may not contain `@`, so it can never shadow a directory identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::EmailAddress;
use crate::errors::DomainError;

/// Longest accepted username; long enough for any email address
pub const MAX_USERNAME_LENGTH: usize = 254;

/// A normalized (trimmed, lowercased) username
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Normalize and validate a raw username
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUsername` when the name is empty after
    /// trimming, too long, or contains whitespace or control characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = raw.as_ref().trim().to_lowercase();

        if value.is_empty() {
            return Err(DomainError::InvalidUsername(
                "username must not be empty".to_string(),
            ));
        }
        if value.chars().count() > MAX_USERNAME_LENGTH {
            return Err(DomainError::InvalidUsername(format!(
                "username exceeds {MAX_USERNAME_LENGTH} characters"
            )));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::InvalidUsername(format!(
                "username contains whitespace: {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Normalize and validate a username for a local account
    ///
    /// # Errors
    ///
    /// Everything `new` rejects, plus names containing `@`.
    pub fn new_local(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let name = Self::new(raw)?;
        if name.0.contains('@') {
            return Err(DomainError::InvalidUsername(
                "local usernames may not contain '@'".to_string(),
            ));
        }
        Ok(name)
    }

    /// Username of a directory identity
    pub fn from_email(email: &EmailAddress) -> Self {
        Self(email.as_str().to_string())
    }

    /// Get the username as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Username {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed_and_lowercased() {
        let name = Username::new("  Anna ").unwrap();
        assert_eq!(name.as_str(), "anna");
    }

    #[test]
    fn empty_username_is_rejected() {
        assert!(Username::new("").is_err());
        assert!(Username::new("   ").is_err());
    }

    #[test]
    fn inner_whitespace_is_rejected() {
        assert!(Username::new("anna b").is_err());
    }

    #[test]
    fn overly_long_username_is_rejected() {
        let raw = "a".repeat(MAX_USERNAME_LENGTH + 1);
        assert!(Username::new(raw).is_err());
    }

    #[test]
    fn local_username_rejects_email_shape() {
        assert!(Username::new_local("chef@hospital.dk").is_err());
        assert_eq!(Username::new_local(" Anna ").unwrap().as_str(), "anna");
        assert!(Username::new("chef@hospital.dk").is_ok());
    }

    #[test]
    fn from_email_uses_normalized_address() {
        let email = EmailAddress::new("Alice@Hospital.dk").unwrap();
        assert_eq!(Username::from_email(&email).as_str(), "alice@hospital.dk");
    }

    #[test]
    fn deserialization_normalizes() {
        let name: Username = serde_json::from_str("\"DevAdmin\"").unwrap();
        assert_eq!(name.as_str(), "devadmin");
        assert!(serde_json::from_str::<Username>("\"\"").is_err());
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "\\s{0,2}[A-Za-z0-9._@-]{1,30}\\s{0,2}") {
            let once = Username::new(&raw).unwrap();
            let twice = Username::new(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_names_are_lowercase(raw in "[A-Za-z0-9]{1,30}") {
            let name = Username::new(&raw).unwrap();
            prop_assert_eq!(name.as_str(), raw.to_lowercase());
        }
    }
}
