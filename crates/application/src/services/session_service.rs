//! Session resolver - turns credentials into sessions
//!
//! Local credentials are verified by the [`CredentialService`], directory
//! identities by the [`DirectoryPolicy`]. Either way the outcome is a
//! [`Session`] whose role is fixed for its lifetime.

use std::{fmt, sync::Arc};

use chrono::{TimeDelta, Utc};
use domain::{ActivityEvent, ActivityEventType, Role, Session, SessionId, User};
use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};

use super::{
    credential_service::{CredentialService, NewLocalUser},
    directory_policy::DirectoryPolicy,
};
use crate::{
    error::ApplicationError,
    ports::{ActivityLogPort, SessionStore, UserStore},
};

/// Default idle timeout of a session
pub const DEFAULT_IDLE_TIMEOUT: TimeDelta = TimeDelta::hours(8);

/// What a user presents to sign in
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username and password of a local account
    Local {
        username: String,
        password: SecretString,
    },
    /// Email asserted by the upstream single-sign-on layer
    Directory {
        email: String,
        requested_role: Option<Role>,
    },
}

/// Input for patient self-signup
#[derive(Debug, Clone)]
pub struct PatientSignup {
    pub username: String,
    pub password: SecretString,
    pub display_name: Option<String>,
    pub therapist: String,
}

/// Authenticates users and resolves session tokens
pub struct SessionResolver {
    credentials: Arc<CredentialService>,
    directory: DirectoryPolicy,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    activity: Arc<dyn ActivityLogPort>,
    idle_timeout: TimeDelta,
}

impl fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionResolver")
            .field("directory", &self.directory)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionResolver {
    pub fn new(
        credentials: Arc<CredentialService>,
        directory: DirectoryPolicy,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        activity: Arc<dyn ActivityLogPort>,
    ) -> Self {
        Self {
            credentials,
            directory,
            users,
            sessions,
            activity,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Set the idle timeout after which sessions are rejected
    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: TimeDelta) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub const fn idle_timeout(&self) -> TimeDelta {
        self.idle_timeout
    }

    pub const fn directory(&self) -> &DirectoryPolicy {
        &self.directory
    }

    /// Authenticate and open a session
    ///
    /// Any failure leaves no session behind.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for a bad local login or a directory email that
    /// collides with a local account, `DomainRejected` for a directory
    /// identity outside the allowed domain.
    #[instrument(skip(self, credentials))]
    pub async fn authenticate(&self, credentials: Credentials) -> Result<Session, ApplicationError> {
        let user = match credentials {
            Credentials::Local { username, password } => {
                self.credentials.verify_local_user(&username, &password).await?
            },
            Credentials::Directory {
                email,
                requested_role,
            } => self.directory_user(&email, requested_role).await?,
        };

        self.open_session(&user).await
    }

    /// Create a patient account linked to a therapist and sign it in
    #[instrument(skip(self, signup), fields(username = %signup.username))]
    pub async fn signup_patient(&self, signup: PatientSignup) -> Result<Session, ApplicationError> {
        let user = self
            .credentials
            .create_local_user(NewLocalUser {
                username: signup.username,
                password: signup.password,
                role: Role::Patient,
                display_name: signup.display_name,
                therapist: Some(signup.therapist),
            })
            .await?;

        self.open_session(&user).await
    }

    /// Resolve a bearer token to a live session and refresh it
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for malformed, unknown or expired tokens.
    pub async fn resolve(&self, token: &str) -> Result<Session, ApplicationError> {
        let id = SessionId::parse(token).map_err(|_| ApplicationError::Unauthenticated)?;
        let now = Utc::now();

        let Some(session) = self.sessions.get(id).await? else {
            return Err(ApplicationError::Unauthenticated);
        };

        if session.is_expired(self.idle_timeout, now) {
            debug!(session = %id.log_prefix(), "Session expired");
            self.sessions.remove(id).await?;
            return Err(ApplicationError::Unauthenticated);
        }

        self.sessions
            .touch(id, now)
            .await?
            .ok_or(ApplicationError::Unauthenticated)
    }

    /// Destroy a session
    ///
    /// Unknown tokens are ignored.
    #[instrument(skip(self, session), fields(session = %session.id().log_prefix()))]
    pub async fn logout(&self, session: &Session) -> Result<(), ApplicationError> {
        if self.sessions.remove(session.id()).await?.is_some() {
            self.record(ActivityEvent::new(
                session.username().clone(),
                ActivityEventType::Logout,
            ))
            .await;
            info!(username = %session.username(), "Logged out");
        }
        Ok(())
    }

    /// Drop idle sessions, returning how many were removed
    pub async fn purge_expired(&self) -> Result<usize, ApplicationError> {
        let removed = self
            .sessions
            .purge_expired(self.idle_timeout, Utc::now())
            .await?;
        if removed > 0 {
            debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    async fn directory_user(
        &self,
        email: &str,
        requested_role: Option<Role>,
    ) -> Result<User, ApplicationError> {
        let (email, role) = self.directory.resolve_employee(email, requested_role)?;
        let user = User::new_directory(&email, role)?;
        match self.users.upsert_directory_user(&user).await {
            Err(ApplicationError::DuplicateUser(_)) => {
                warn!(username = %user.username(), "Directory login collides with a local account");
                Err(ApplicationError::InvalidCredentials)
            },
            other => other,
        }
    }

    async fn open_session(&self, user: &User) -> Result<Session, ApplicationError> {
        let session = Session::for_user(user);
        self.sessions.insert(session.clone()).await?;

        self.record(
            ActivityEvent::new(user.username().clone(), ActivityEventType::Login)
                .with_payload(serde_json::json!({ "method": user.auth_method().to_string() })),
        )
        .await;

        info!(
            username = %user.username(),
            role = %user.role(),
            session = %session.id().log_prefix(),
            "Session opened"
        );
        Ok(session)
    }

    async fn record(&self, event: ActivityEvent) {
        if let Err(e) = self.activity.record(&event).await {
            warn!(error = %e, event = event.event_type.as_str(), "Failed to record activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;
    use chrono::DateTime;
    use domain::{AuthMethod, Conversation, EmailAddress, Username};

    use super::*;
    use crate::{
        ports::{MockActivityLogPort, MockPasswordHasher, MockUserStore},
        services::directory_policy::RoleOverrides,
    };

    /// Minimal session store so resolve/touch/expiry can be observed
    #[derive(Default)]
    struct MapSessions(Mutex<HashMap<SessionId, Session>>);

    #[async_trait]
    impl SessionStore for MapSessions {
        async fn insert(&self, session: Session) -> Result<(), ApplicationError> {
            self.0.lock().unwrap().insert(session.id(), session);
            Ok(())
        }

        async fn touch(
            &self,
            id: SessionId,
            now: DateTime<Utc>,
        ) -> Result<Option<Session>, ApplicationError> {
            let mut map = self.0.lock().unwrap();
            Ok(map.get_mut(&id).map(|s| {
                s.touch(now);
                s.clone()
            }))
        }

        async fn get(&self, id: SessionId) -> Result<Option<Session>, ApplicationError> {
            Ok(self.0.lock().unwrap().get(&id).cloned())
        }

        async fn remove(&self, id: SessionId) -> Result<Option<Session>, ApplicationError> {
            Ok(self.0.lock().unwrap().remove(&id))
        }

        async fn purge_expired(
            &self,
            idle_timeout: TimeDelta,
            now: DateTime<Utc>,
        ) -> Result<usize, ApplicationError> {
            let mut map = self.0.lock().unwrap();
            let before = map.len();
            map.retain(|_, s| !s.is_expired(idle_timeout, now));
            Ok(before - map.len())
        }

        async fn conversation(&self, _id: SessionId) -> Result<Option<Conversation>, ApplicationError> {
            Ok(None)
        }

        async fn save_conversation(
            &self,
            _id: SessionId,
            _conversation: Conversation,
        ) -> Result<(), ApplicationError> {
            Ok(())
        }
    }

    fn fake_hasher() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().returning(|p| Ok(format!("hashed:{p}")));
        hasher
            .expect_verify()
            .returning(|p, h| Ok(h == format!("hashed:{p}")));
        hasher
    }

    fn quiet_activity() -> MockActivityLogPort {
        let mut activity = MockActivityLogPort::new();
        activity.expect_record().returning(|_| Ok(()));
        activity
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn patient(username: &str, password: &str) -> User {
        User::new_local(
            Username::new(username).unwrap(),
            format!("hashed:{password}"),
            Role::Patient,
            None,
            Some(Username::new("tina@hospital.dk").unwrap()),
        )
        .unwrap()
    }

    fn resolver_with(
        users: MockUserStore,
        directory: DirectoryPolicy,
        activity: MockActivityLogPort,
    ) -> (SessionResolver, Arc<MapSessions>) {
        let users: Arc<dyn UserStore> = Arc::new(users);
        let credentials = Arc::new(CredentialService::new(
            Arc::clone(&users),
            Arc::new(fake_hasher()),
        ));
        let sessions = Arc::new(MapSessions::default());
        let resolver = SessionResolver::new(
            credentials,
            directory,
            users,
            Arc::clone(&sessions) as Arc<dyn SessionStore>,
            Arc::new(activity),
        );
        (resolver, sessions)
    }

    fn hospital() -> DirectoryPolicy {
        DirectoryPolicy::new(
            Some("hospital.dk"),
            RoleOverrides::from_json(r#"{"alice@hospital.dk": "manager"}"#),
            Role::Therapist,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn local_login_opens_patient_session() {
        let mut users = MockUserStore::new();
        users
            .expect_find()
            .returning(|_| Ok(Some(patient("anna", "secret123"))));
        let (resolver, sessions) = resolver_with(users, DirectoryPolicy::open(), quiet_activity());

        let session = resolver
            .authenticate(Credentials::Local {
                username: "Anna".into(),
                password: secret("secret123"),
            })
            .await
            .unwrap();

        assert_eq!(session.role(), Role::Patient);
        assert_eq!(session.auth_method(), AuthMethod::Local);
        assert_eq!(sessions.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wrong_password_opens_nothing() {
        let mut users = MockUserStore::new();
        users
            .expect_find()
            .returning(|_| Ok(Some(patient("anna", "secret123"))));
        let mut activity = MockActivityLogPort::new();
        activity.expect_record().never();
        let (resolver, sessions) = resolver_with(users, DirectoryPolicy::open(), activity);

        let err = resolver
            .authenticate(Credentials::Local {
                username: "anna".into(),
                password: secret("wrong-one"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::InvalidCredentials));
        assert!(sessions.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn directory_login_applies_override_and_upserts() {
        let mut users = MockUserStore::new();
        users
            .expect_upsert_directory_user()
            .times(1)
            .returning(|u| Ok(u.clone()));
        let (resolver, _) = resolver_with(users, hospital(), quiet_activity());

        let session = resolver
            .authenticate(Credentials::Directory {
                email: "alice@hospital.dk".into(),
                requested_role: None,
            })
            .await
            .unwrap();

        assert_eq!(session.role(), Role::Manager);
        assert_eq!(session.auth_method(), AuthMethod::Directory);
        assert_eq!(session.username().as_str(), "alice@hospital.dk");
        assert_eq!(session.display_name(), "Alice");
    }

    #[tokio::test]
    async fn directory_login_outside_domain_fails_closed() {
        let mut users = MockUserStore::new();
        users.expect_upsert_directory_user().never();
        let (resolver, sessions) = resolver_with(users, hospital(), quiet_activity());

        let err = resolver
            .authenticate(Credentials::Directory {
                email: "x@other.dk".into(),
                requested_role: Some(Role::Manager),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::DomainRejected(_)));
        assert!(sessions.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn directory_login_colliding_with_local_account_is_a_login_failure() {
        let mut users = MockUserStore::new();
        users
            .expect_upsert_directory_user()
            .returning(|u| Err(ApplicationError::DuplicateUser(u.username().to_string())));
        let (resolver, sessions) = resolver_with(users, hospital(), quiet_activity());

        let err = resolver
            .authenticate(Credentials::Directory {
                email: "chef@hospital.dk".into(),
                requested_role: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::InvalidCredentials));
        assert!(sessions.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolve_refreshes_and_keeps_role() {
        let mut users = MockUserStore::new();
        users
            .expect_find()
            .returning(|_| Ok(Some(patient("anna", "secret123"))));
        let (resolver, _) = resolver_with(users, DirectoryPolicy::open(), quiet_activity());

        let session = resolver
            .authenticate(Credentials::Local {
                username: "anna".into(),
                password: secret("secret123"),
            })
            .await
            .unwrap();

        let resolved = resolver.resolve(&session.id().to_string()).await.unwrap();
        assert_eq!(resolved.id(), session.id());
        assert_eq!(resolved.role(), Role::Patient);
        assert!(resolved.last_seen_at() >= session.last_seen_at());
    }

    #[tokio::test]
    async fn resolve_rejects_garbage_and_unknown_tokens() {
        let (resolver, _) = resolver_with(MockUserStore::new(), DirectoryPolicy::open(), quiet_activity());

        assert!(matches!(
            resolver.resolve("not-a-token").await,
            Err(ApplicationError::Unauthenticated)
        ));
        assert!(matches!(
            resolver.resolve(&SessionId::new().to_string()).await,
            Err(ApplicationError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_removed() {
        let (resolver, sessions) = resolver_with(MockUserStore::new(), DirectoryPolicy::open(), quiet_activity());
        let resolver = resolver.with_idle_timeout(TimeDelta::zero());

        let session = Session::for_user(&patient("anna", "secret123"));
        let token = session.id().to_string();
        sessions.insert(session).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert!(matches!(
            resolver.resolve(&token).await,
            Err(ApplicationError::Unauthenticated)
        ));
        assert!(sessions.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn logout_destroys_session() {
        let mut users = MockUserStore::new();
        users
            .expect_find()
            .returning(|_| Ok(Some(patient("anna", "secret123"))));
        let (resolver, _) = resolver_with(users, DirectoryPolicy::open(), quiet_activity());

        let session = resolver
            .authenticate(Credentials::Local {
                username: "anna".into(),
                password: secret("secret123"),
            })
            .await
            .unwrap();

        resolver.logout(&session).await.unwrap();
        assert!(resolver.resolve(&session.id().to_string()).await.is_err());
        // second logout is a no-op
        resolver.logout(&session).await.unwrap();
    }

    #[tokio::test]
    async fn activity_failure_does_not_block_login() {
        let mut users = MockUserStore::new();
        users
            .expect_find()
            .returning(|_| Ok(Some(patient("anna", "secret123"))));
        let mut activity = MockActivityLogPort::new();
        activity
            .expect_record()
            .returning(|_| Err(ApplicationError::Internal("db down".into())));
        let (resolver, _) = resolver_with(users, DirectoryPolicy::open(), activity);

        let result = resolver
            .authenticate(Credentials::Local {
                username: "anna".into(),
                password: secret("secret123"),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn signup_links_patient_to_therapist() {
        let mut users = MockUserStore::new();
        users.expect_find().returning(|u| {
            if u.as_str() == "tina@hospital.dk" {
                let email = EmailAddress::new("tina@hospital.dk").unwrap();
                Ok(Some(User::new_directory(&email, Role::Therapist).unwrap()))
            } else {
                Ok(None)
            }
        });
        users
            .expect_insert()
            .withf(|u| u.role() == Role::Patient && u.therapist().is_some())
            .times(1)
            .returning(|_| Ok(()));
        let (resolver, _) = resolver_with(users, DirectoryPolicy::open(), quiet_activity());

        let session = resolver
            .signup_patient(PatientSignup {
                username: "bo".into(),
                password: secret("secret123"),
                display_name: Some("Bo".into()),
                therapist: "tina@hospital.dk".into(),
            })
            .await
            .unwrap();

        assert_eq!(session.role(), Role::Patient);
        assert_eq!(session.display_name(), "Bo");
    }

    #[tokio::test]
    async fn purge_expired_counts_removed_sessions() {
        let (resolver, sessions) = resolver_with(MockUserStore::new(), DirectoryPolicy::open(), quiet_activity());
        let resolver = resolver.with_idle_timeout(TimeDelta::zero());
        sessions
            .insert(Session::for_user(&patient("anna", "secret123")))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert_eq!(resolver.purge_expired().await.unwrap(), 1);
    }
}
