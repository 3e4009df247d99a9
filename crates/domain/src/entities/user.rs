//! User account entity
//!
//! A user holds exactly one role. Local users always carry a password
//! hash, directory users never do; the credential enum makes any other
//! combination unrepresentable.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::{
    errors::DomainError,
    value_objects::{AuthMethod, EmailAddress, Permission, Role, Username},
};

/// Minimum number of characters in a local password
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a candidate password against the password policy
///
/// # Errors
///
/// Returns `DomainError::WeakPassword` when the password is too short.
pub fn check_password_policy(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::WeakPassword(format!(
            "at least {MIN_PASSWORD_LENGTH} characters required"
        )));
    }
    Ok(())
}

/// How the account authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum UserCredential {
    /// PHC-formatted password hash
    Local { password_hash: String },
    /// Identity asserted by the directory; no secret stored
    Directory,
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { .. } => f
                .debug_struct("Local")
                .field("password_hash", &"[REDACTED]")
                .finish(),
            Self::Directory => f.write_str("Directory"),
        }
    }
}

/// A persisted user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    username: Username,
    display_name: String,
    role: Role,
    credential: UserCredential,
    therapist: Option<Username>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Create a local account
    ///
    /// # Errors
    ///
    /// Fails when the role cannot be held by a local account, or when a
    /// patient is not linked to a therapist.
    pub fn new_local(
        username: Username,
        password_hash: impl Into<String>,
        role: Role,
        display_name: Option<String>,
        therapist: Option<Username>,
    ) -> Result<Self, DomainError> {
        if !role.is_local() {
            return Err(DomainError::NotPermitted(format!(
                "role {role} cannot be assigned to a local account"
            )));
        }
        if role == Role::Patient && therapist.is_none() {
            return Err(DomainError::ValidationError(
                "a patient must be linked to a therapist".to_string(),
            ));
        }

        let display_name = display_name
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| username.to_string());

        Ok(Self {
            username,
            display_name,
            role,
            credential: UserCredential::Local {
                password_hash: password_hash.into(),
            },
            therapist,
            created_at: Utc::now(),
        })
    }

    /// Create a directory (staff) account from an asserted email
    ///
    /// # Errors
    ///
    /// Fails when the role is not a staff role.
    pub fn new_directory(email: &EmailAddress, role: Role) -> Result<Self, DomainError> {
        if !role.is_staff() {
            return Err(DomainError::NotPermitted(format!(
                "role {role} cannot be assigned to a directory account"
            )));
        }

        Ok(Self {
            username: Username::from_email(email),
            display_name: email.display_name(),
            role,
            credential: UserCredential::Directory,
            therapist: None,
            created_at: Utc::now(),
        })
    }

    /// Rebuild a user from stored columns, enforcing the hash invariant
    ///
    /// # Errors
    ///
    /// Fails when a local row has no hash or a directory row has one.
    pub fn restore(
        username: Username,
        display_name: String,
        role: Role,
        auth_method: AuthMethod,
        password_hash: Option<String>,
        therapist: Option<Username>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let credential = match (auth_method, password_hash) {
            (AuthMethod::Local, Some(password_hash)) => UserCredential::Local { password_hash },
            (AuthMethod::Directory, None) => UserCredential::Directory,
            (AuthMethod::Local, None) => {
                return Err(DomainError::ValidationError(format!(
                    "local user {username} has no password hash"
                )));
            },
            (AuthMethod::Directory, Some(_)) => {
                return Err(DomainError::ValidationError(format!(
                    "directory user {username} carries a password hash"
                )));
            },
        };

        Ok(Self {
            username,
            display_name,
            role,
            credential,
            therapist,
            created_at,
        })
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

    pub const fn credential(&self) -> &UserCredential {
        &self.credential
    }

    pub fn therapist(&self) -> Option<&Username> {
        self.therapist.as_ref()
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Authentication method implied by the credential
    pub const fn auth_method(&self) -> AuthMethod {
        match self.credential {
            UserCredential::Local { .. } => AuthMethod::Local,
            UserCredential::Directory => AuthMethod::Directory,
        }
    }

    /// Password hash of a local account
    pub fn password_hash(&self) -> Option<&str> {
        match &self.credential {
            UserCredential::Local { password_hash } => Some(password_hash),
            UserCredential::Directory => None,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Replace the password hash of a local account
    ///
    /// # Errors
    ///
    /// Directory accounts have no password to change.
    pub fn with_password_hash(mut self, password_hash: impl Into<String>) -> Result<Self, DomainError> {
        match self.credential {
            UserCredential::Local { .. } => {
                self.credential = UserCredential::Local {
                    password_hash: password_hash.into(),
                };
                Ok(self)
            },
            UserCredential::Directory => Err(DomainError::NotPermitted(
                "directory accounts have no local password".to_string(),
            )),
        }
    }

    /// Override the display name
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    #[test]
    fn local_patient_requires_therapist() {
        let err = User::new_local(name("anna"), "$argon2id$x", Role::Patient, None, None).unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));

        let user = User::new_local(
            name("anna"),
            "$argon2id$x",
            Role::Patient,
            None,
            Some(name("tina@hospital.dk")),
        )
        .unwrap();
        assert_eq!(user.therapist().unwrap().as_str(), "tina@hospital.dk");
    }

    #[test]
    fn local_account_cannot_be_staff_only_role() {
        for role in [Role::Therapist, Role::Manager] {
            let result = User::new_local(name("bob"), "hash", role, None, None);
            assert!(matches!(result, Err(DomainError::NotPermitted(_))));
        }
    }

    #[test]
    fn local_display_name_defaults_to_username() {
        let user = User::new_local(name("devadmin"), "hash", Role::Developer, None, None).unwrap();
        assert_eq!(user.display_name(), "devadmin");

        let user = User::new_local(
            name("devadmin"),
            "hash",
            Role::Developer,
            Some("  ".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(user.display_name(), "devadmin");
    }

    #[test]
    fn directory_user_has_no_hash() {
        let email = EmailAddress::new("alice.berg@hospital.dk").unwrap();
        let user = User::new_directory(&email, Role::Manager).unwrap();
        assert_eq!(user.auth_method(), AuthMethod::Directory);
        assert!(user.password_hash().is_none());
        assert_eq!(user.display_name(), "Alice Berg");
        assert_eq!(user.username().as_str(), "alice.berg@hospital.dk");
    }

    #[test]
    fn directory_user_cannot_be_patient() {
        let email = EmailAddress::new("p@hospital.dk").unwrap();
        assert!(User::new_directory(&email, Role::Patient).is_err());
    }

    #[test]
    fn restore_enforces_hash_invariant() {
        let now = Utc::now();
        assert!(
            User::restore(name("a"), "A".into(), Role::Developer, AuthMethod::Local, None, None, now)
                .is_err()
        );
        assert!(
            User::restore(
                name("a@b.dk"),
                "A".into(),
                Role::Therapist,
                AuthMethod::Directory,
                Some("hash".into()),
                None,
                now
            )
            .is_err()
        );
        let user = User::restore(
            name("a"),
            "A".into(),
            Role::Developer,
            AuthMethod::Local,
            Some("hash".into()),
            None,
            now,
        )
        .unwrap();
        assert_eq!(user.password_hash(), Some("hash"));
    }

    #[test]
    fn password_change_only_for_local() {
        let user = User::new_local(name("dev"), "old", Role::Developer, None, None).unwrap();
        let user = user.with_password_hash("new").unwrap();
        assert_eq!(user.password_hash(), Some("new"));

        let email = EmailAddress::new("t@hospital.dk").unwrap();
        let staff = User::new_directory(&email, Role::Therapist).unwrap();
        assert!(staff.with_password_hash("x").is_err());
    }

    #[test]
    fn debug_output_redacts_hash() {
        let user = User::new_local(name("dev"), "secret-hash", Role::Developer, None, None).unwrap();
        let debug = format!("{user:?}");
        assert!(!debug.contains("secret-hash"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn password_policy_counts_characters() {
        assert!(check_password_policy("short").is_err());
        assert!(check_password_policy("changeme123").is_ok());
        assert!(check_password_policy("æøåæøåæø").is_ok());
        assert!(check_password_policy("æøåæøåæ").is_err());
    }
}
