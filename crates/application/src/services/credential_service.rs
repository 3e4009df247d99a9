//! Credential service - local accounts and password verification

use std::{fmt, sync::Arc};

use domain::{DomainError, Role, User, UserCredential, Username, check_password_policy};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{PasswordHasher, UserStore},
};

/// Hashed once and verified against for unknown users, so a missing
/// account costs the same time as a wrong password
const TIMING_DUMMY_PASSWORD: &str = "timing-equalizer-password";

/// Input for creating a local account
#[derive(Debug, Clone)]
pub struct NewLocalUser {
    pub username: String,
    pub password: SecretString,
    pub role: Role,
    pub display_name: Option<String>,
    /// Username of the therapist a patient is linked to
    pub therapist: Option<String>,
}

/// Creates and verifies local (username/password) accounts
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    dummy_hash: OnceCell<Option<String>>,
}

impl fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialService").finish_non_exhaustive()
    }
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users,
            hasher,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Create a local account
    ///
    /// # Errors
    ///
    /// - `DuplicateUser` if the username is taken
    /// - `Domain` for an empty or email-shaped username, a short password, a non-local
    ///   role, or a patient without a known therapist
    #[instrument(skip(self, new_user), fields(username = %new_user.username, role = %new_user.role))]
    pub async fn create_local_user(&self, new_user: NewLocalUser) -> Result<User, ApplicationError> {
        let username = Username::new_local(&new_user.username)?;
        check_password_policy(new_user.password.expose_secret())?;

        if !new_user.role.is_local() {
            return Err(DomainError::NotPermitted(format!(
                "role {} cannot be assigned to a local account",
                new_user.role
            ))
            .into());
        }

        let therapist = match new_user.therapist.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Some(self.require_therapist(t).await?),
            _ => None,
        };

        if self.users.find(&username).await?.is_some() {
            return Err(ApplicationError::DuplicateUser(username.to_string()));
        }

        let password_hash = self.hash_password(new_user.password).await?;
        let user = User::new_local(
            username,
            password_hash,
            new_user.role,
            new_user.display_name,
            therapist,
        )?;

        self.users.insert(&user).await?;
        info!(username = %user.username(), role = %user.role(), "Local user created");
        Ok(user)
    }

    /// Verify a local username/password pair
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for unknown users, directory accounts
    /// and wrong passwords alike.
    #[instrument(skip(self, password))]
    pub async fn verify_local_user(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<User, ApplicationError> {
        let Ok(username) = Username::new(username) else {
            return Err(ApplicationError::InvalidCredentials);
        };

        let user = self.users.find(&username).await?;
        let Some(user) = user.filter(|u| matches!(u.credential(), UserCredential::Local { .. })) else {
            self.burn_verification(password).await;
            debug!("Unknown or non-local account");
            return Err(ApplicationError::InvalidCredentials);
        };

        let hash = user.password_hash().unwrap_or_default().to_string();
        match self.verify_password(password.clone(), hash).await {
            Ok(true) => Ok(user),
            Ok(false) => {
                debug!("Password mismatch");
                Err(ApplicationError::InvalidCredentials)
            },
            Err(e) => {
                warn!(error = %e, "Stored password hash could not be verified");
                Err(ApplicationError::InvalidCredentials)
            },
        }
    }

    /// Change the password of a local account after re-verifying the
    /// current one
    #[instrument(skip(self, current, new_password))]
    pub async fn change_password(
        &self,
        username: &str,
        current: &SecretString,
        new_password: SecretString,
    ) -> Result<(), ApplicationError> {
        let user = self.verify_local_user(username, current).await?;
        check_password_policy(new_password.expose_secret())?;

        let password_hash = self.hash_password(new_password).await?;
        let user = user.with_password_hash(password_hash)?;
        let hash = user.password_hash().unwrap_or_default();
        self.users
            .update_password_hash(user.username(), hash)
            .await?;

        info!(username = %user.username(), "Password changed");
        Ok(())
    }

    /// Hash a password on the blocking pool
    pub(crate) async fn hash_password(&self, password: SecretString) -> Result<String, ApplicationError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
            .await
            .map_err(|e| ApplicationError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify_password(&self, password: SecretString, hash: String) -> Result<bool, ApplicationError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(password.expose_secret(), &hash))
            .await
            .map_err(|e| ApplicationError::Internal(format!("verification task failed: {e}")))?
    }

    async fn burn_verification(&self, password: &SecretString) {
        let dummy = self
            .dummy_hash
            .get_or_init(|| async {
                self.hash_password(SecretString::from(TIMING_DUMMY_PASSWORD.to_string()))
                    .await
                    .ok()
            })
            .await
            .clone();
        if let Some(hash) = dummy {
            let _ = self.verify_password(password.clone(), hash).await;
        }
    }

    async fn require_therapist(&self, raw: &str) -> Result<Username, ApplicationError> {
        let username = Username::new(raw)?;
        match self.users.find(&username).await? {
            Some(user) if user.role() == Role::Therapist => Ok(username),
            _ => Err(DomainError::ValidationError(format!("unknown therapist: {username}")).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::EmailAddress;
    use mockall::predicate::*;

    use super::*;
    use crate::ports::{MockPasswordHasher, MockUserStore};

    /// Reversible stand-in for a real hash so tests stay fast
    fn fake_hasher() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|p| Ok(format!("hashed:{p}")));
        hasher
            .expect_verify()
            .returning(|p, h| Ok(h == format!("hashed:{p}")));
        hasher
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn therapist() -> User {
        let email = EmailAddress::new("tina@hospital.dk").unwrap();
        User::new_directory(&email, Role::Therapist).unwrap()
    }

    fn stored_local(username: &str, password: &str) -> User {
        User::new_local(
            Username::new(username).unwrap(),
            format!("hashed:{password}"),
            Role::Developer,
            None,
            None,
        )
        .unwrap()
    }

    fn new_patient(password: &str) -> NewLocalUser {
        NewLocalUser {
            username: "  Anna ".to_string(),
            password: secret(password),
            role: Role::Patient,
            display_name: Some("Anna".to_string()),
            therapist: Some("tina@hospital.dk".to_string()),
        }
    }

    #[tokio::test]
    async fn create_patient_normalizes_and_stores() {
        let mut store = MockUserStore::new();
        store
            .expect_find()
            .with(eq(Username::new("tina@hospital.dk").unwrap()))
            .returning(|_| Ok(Some(therapist())));
        store
            .expect_find()
            .with(eq(Username::new("anna").unwrap()))
            .returning(|_| Ok(None));
        store
            .expect_insert()
            .withf(|u| u.username().as_str() == "anna" && u.password_hash() == Some("hashed:hemmelig123"))
            .times(1)
            .returning(|_| Ok(()));

        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let user = service.create_local_user(new_patient("hemmelig123")).await.unwrap();

        assert_eq!(user.username().as_str(), "anna");
        assert_eq!(user.role(), Role::Patient);
        assert_eq!(user.therapist().unwrap().as_str(), "tina@hospital.dk");
    }

    #[tokio::test]
    async fn create_rejects_duplicate() {
        let mut store = MockUserStore::new();
        store.expect_find().returning(|name| {
            if name.as_str() == "tina@hospital.dk" {
                Ok(Some(therapist()))
            } else {
                Ok(Some(stored_local("anna", "whatever1")))
            }
        });
        store.expect_insert().never();

        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let err = service.create_local_user(new_patient("hemmelig123")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::DuplicateUser(ref u) if u == "anna"));
    }

    #[tokio::test]
    async fn create_rejects_short_password() {
        let store = MockUserStore::new();
        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let err = service.create_local_user(new_patient("kort")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn create_rejects_staff_role() {
        let store = MockUserStore::new();
        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let mut request = new_patient("hemmelig123");
        request.role = Role::Manager;
        let err = service.create_local_user(request).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::NotPermitted(_))));
    }

    #[tokio::test]
    async fn create_patient_requires_known_therapist() {
        let mut store = MockUserStore::new();
        store.expect_find().returning(|_| Ok(None));
        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));

        let err = service.create_local_user(new_patient("hemmelig123")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::ValidationError(_))));

        let mut request = new_patient("hemmelig123");
        request.therapist = None;
        let err = service.create_local_user(request).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn verify_accepts_correct_password() {
        let mut store = MockUserStore::new();
        store
            .expect_find()
            .returning(|_| Ok(Some(stored_local("devadmin", "changeme123"))));

        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let user = service
            .verify_local_user("DevAdmin", &secret("changeme123"))
            .await
            .unwrap();
        assert_eq!(user.username().as_str(), "devadmin");
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let mut store = MockUserStore::new();
        store
            .expect_find()
            .returning(|_| Ok(Some(stored_local("devadmin", "changeme123"))));

        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let err = service
            .verify_local_user("devadmin", &secret("changeme124"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_unknown_user_still_burns_a_verification() {
        let mut store = MockUserStore::new();
        store.expect_find().returning(|_| Ok(None));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().times(1).returning(|p| Ok(format!("hashed:{p}")));
        hasher.expect_verify().times(1).returning(|_, _| Ok(false));

        let service = CredentialService::new(Arc::new(store), Arc::new(hasher));
        let err = service
            .verify_local_user("ghost", &secret("whatever1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidCredentials));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dummy_hash_is_computed_off_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let mut store = MockUserStore::new();
        store.expect_find().returning(|_| Ok(None));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().times(1).returning(move |p| {
            assert_ne!(std::thread::current().id(), runtime_thread);
            Ok(format!("hashed:{p}"))
        });
        hasher.expect_verify().times(2).returning(|_, _| Ok(false));

        let service = CredentialService::new(Arc::new(store), Arc::new(hasher));
        for _ in 0..2 {
            let err = service
                .verify_local_user("ghost", &secret("whatever1"))
                .await
                .unwrap_err();
            assert!(matches!(err, ApplicationError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn verify_rejects_directory_account() {
        let mut store = MockUserStore::new();
        store.expect_find().returning(|_| Ok(Some(therapist())));

        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let err = service
            .verify_local_user("tina@hospital.dk", &secret("anything1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_malformed_hash_fails_closed() {
        let mut store = MockUserStore::new();
        store
            .expect_find()
            .returning(|_| Ok(Some(stored_local("devadmin", "x"))));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .returning(|_, _| Err(ApplicationError::Internal("bad phc".into())));

        let service = CredentialService::new(Arc::new(store), Arc::new(hasher));
        let err = service
            .verify_local_user("devadmin", &secret("changeme123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn change_password_updates_hash() {
        let mut store = MockUserStore::new();
        store
            .expect_find()
            .returning(|_| Ok(Some(stored_local("devadmin", "changeme123"))));
        store
            .expect_update_password_hash()
            .withf(|name, hash| name.as_str() == "devadmin" && hash == "hashed:nyt-kodeord")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        service
            .change_password("devadmin", &secret("changeme123"), secret("nyt-kodeord"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn change_password_requires_current() {
        let mut store = MockUserStore::new();
        store
            .expect_find()
            .returning(|_| Ok(Some(stored_local("devadmin", "changeme123"))));
        store.expect_update_password_hash().never();

        let service = CredentialService::new(Arc::new(store), Arc::new(fake_hasher()));
        let err = service
            .change_password("devadmin", &secret("wrong-one"), secret("nyt-kodeord"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidCredentials));
    }
}
