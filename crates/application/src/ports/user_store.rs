//! User storage port
//!
//! Defines the interface for persisting local and directory accounts.

use async_trait::async_trait;
use domain::{Role, User, Username};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for user account persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by username
    async fn find(&self, username: &Username) -> Result<Option<User>, ApplicationError>;

    /// Insert a new user
    ///
    /// Fails with `ApplicationError::DuplicateUser` if the username is taken.
    async fn insert(&self, user: &User) -> Result<(), ApplicationError>;

    /// Insert or refresh a directory account, returning the stored row
    ///
    /// An existing row keeps its `created_at`; role and display name are
    /// replaced. Fails with `DuplicateUser` when the username belongs to a
    /// local account.
    async fn upsert_directory_user(&self, user: &User) -> Result<User, ApplicationError>;

    /// Replace the password hash of a local account
    async fn update_password_hash(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<(), ApplicationError>;

    /// Number of stored users
    async fn count(&self) -> Result<u64, ApplicationError>;

    /// Insert `user` only when the store is empty, atomically
    ///
    /// Returns `true` when the user was inserted.
    async fn insert_if_empty(&self, user: &User) -> Result<bool, ApplicationError>;

    /// All users ordered by role, then username
    async fn list(&self) -> Result<Vec<User>, ApplicationError>;

    /// Users holding `role`, ordered by username
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, ApplicationError>;

    /// Patients linked to `therapist`, ordered by username
    async fn patients_of(&self, therapist: &Username) -> Result<Vec<User>, ApplicationError>;
}
