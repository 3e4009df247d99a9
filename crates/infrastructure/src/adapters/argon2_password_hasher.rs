//! Password hashing using Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt
//! and parameters, so stored hashes stay valid if defaults change later.

use application::{error::ApplicationError, ports::PasswordHasher};
use argon2::{
    Argon2, PasswordHash, PasswordHasher as ArgonPasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{debug, instrument};

/// Argon2id hasher with the crate's default parameters
/// (19 MiB memory, 2 iterations, 1 lane)
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check if a stored value looks like a PHC Argon2 hash
    #[must_use]
    pub fn is_hashed(value: &str) -> bool {
        value.starts_with("$argon2")
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    #[instrument(skip_all)]
    fn hash(&self, password: &str) -> Result<String, ApplicationError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApplicationError::Internal(format!("Failed to hash password: {e}")))?;

        debug!("Password hashed");
        Ok(hash.to_string())
    }

    #[instrument(skip_all)]
    fn verify(&self, password: &str, hash: &str) -> Result<bool, ApplicationError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ApplicationError::Internal(format!("Invalid hash format: {e}")))?;

        let matches = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();

        debug!(matches, "Password verified");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn hash_creates_valid_phc_format() {
        let hash = Argon2PasswordHasher::new().hash("changeme123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("$v="));
        assert!(hash.contains("$m="));
        assert!(Argon2PasswordHasher::is_hashed(&hash));
    }

    #[test]
    fn verify_correct_password_succeeds() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash("kaffe-og-kage").unwrap();

        assert!(hasher.verify("kaffe-og-kage", &hash).unwrap());
        assert!(!hasher.verify("kaffe-og-kagE", &hash).unwrap());
    }

    #[test]
    fn verify_invalid_hash_returns_error() {
        let result = Argon2PasswordHasher::new().verify("anything", "plaintext");
        assert!(matches!(result, Err(ApplicationError::Internal(_))));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let hasher = Argon2PasswordHasher::new();
        let first = hasher.hash("changeme123").unwrap();
        let second = hasher.hash("changeme123").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("changeme123", &first).unwrap());
        assert!(hasher.verify("changeme123", &second).unwrap());
    }

    #[test]
    fn is_hashed_rejects_plaintext() {
        assert!(!Argon2PasswordHasher::is_hashed("changeme123"));
        assert!(!Argon2PasswordHasher::is_hashed(""));
    }

    proptest! {
        // argon2 is slow on purpose; keep the case count small
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn only_the_original_password_verifies(
            password in "[ -~]{8,24}",
            other in "[ -~]{8,24}",
        ) {
            let hasher = Argon2PasswordHasher::new();
            let hash = hasher.hash(&password).unwrap();
            prop_assert!(hasher.verify(&password, &hash).unwrap());
            prop_assert_eq!(hasher.verify(&other, &hash).unwrap(), other == password);
        }
    }
}
