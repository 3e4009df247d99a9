//! Password hashing port

#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for salted, slow password hashing
///
/// Implementations generate a fresh random salt per hash and compare in
/// constant time.
#[cfg_attr(test, automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a password into a self-describing string (salt included)
    fn hash(&self, password: &str) -> Result<String, ApplicationError>;

    /// Verify a password against a stored hash
    ///
    /// Returns `Ok(false)` on mismatch and an error only for malformed hashes.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, ApplicationError>;
}
