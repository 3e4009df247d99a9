//! Roster service - permission-gated views of users and their progress,
//! and patient accounts created by staff

use std::{fmt, sync::Arc};

use domain::{ActivityEvent, DomainError, Permission, Role, Session, User, Username};
use secrecy::SecretString;
use tracing::{debug, info, instrument};

use super::credential_service::{CredentialService, NewLocalUser};
use crate::{
    error::ApplicationError,
    ports::{ActivityCount, ActivityLogPort, UserStore},
};

/// Number of recent events returned with a progress view
const RECENT_ACTIVITY_LIMIT: u32 = 20;

/// A user's activity summary
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProgressReport {
    pub username: Username,
    pub counts: Vec<ActivityCount>,
    pub recent: Vec<ActivityEvent>,
}

/// A patient account opened by a therapist or developer
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub username: String,
    pub password: SecretString,
    pub display_name: Option<String>,
    /// Required when a developer creates the patient; a therapist's
    /// patients are always linked to that therapist
    pub therapist: Option<String>,
}

/// Access to users for therapists, managers and developers
pub struct RosterService {
    users: Arc<dyn UserStore>,
    activity: Arc<dyn ActivityLogPort>,
    credentials: Arc<CredentialService>,
}

impl fmt::Debug for RosterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RosterService").finish_non_exhaustive()
    }
}

fn require(session: &Session, permission: Permission) -> Result<(), ApplicationError> {
    if session.has_permission(permission) {
        Ok(())
    } else {
        debug!(username = %session.username(), permission = permission.as_str(), "Permission denied");
        Err(ApplicationError::Forbidden(permission.as_str().to_string()))
    }
}

fn is_patient_of(user: &User, therapist: &Username) -> bool {
    user.role() == Role::Patient && user.therapist() == Some(therapist)
}

impl RosterService {
    pub fn new(
        users: Arc<dyn UserStore>,
        activity: Arc<dyn ActivityLogPort>,
        credentials: Arc<CredentialService>,
    ) -> Self {
        Self {
            users,
            activity,
            credentials,
        }
    }

    /// Open a patient account on behalf of staff
    ///
    /// # Errors
    ///
    /// `Forbidden` for roles without patients of their own and for a
    /// therapist naming someone else, `Domain` when a developer names no
    /// therapist, plus everything `CredentialService::create_local_user`
    /// rejects.
    #[instrument(skip(self, session, patient), fields(caller = %session.username(), username = %patient.username))]
    pub async fn create_patient(
        &self,
        session: &Session,
        patient: NewPatient,
    ) -> Result<User, ApplicationError> {
        require(session, Permission::ViewAssignedPatients)?;

        let requested = patient
            .therapist
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let therapist = if session.role() == Role::Therapist {
            let named = requested.map(Username::new).transpose()?;
            if named.is_some_and(|name| &name != session.username()) {
                return Err(ApplicationError::Forbidden(
                    "therapists may only create their own patients".to_string(),
                ));
            }
            session.username().to_string()
        } else {
            requested
                .ok_or_else(|| {
                    DomainError::ValidationError("a therapist must be chosen".to_string())
                })?
                .to_string()
        };

        let user = self
            .credentials
            .create_local_user(NewLocalUser {
                username: patient.username,
                password: patient.password,
                role: Role::Patient,
                display_name: patient.display_name,
                therapist: Some(therapist),
            })
            .await?;

        info!(username = %user.username(), therapist = ?user.therapist(), "Patient created by staff");
        Ok(user)
    }

    /// Every user, ordered by role then username
    #[instrument(skip(self, session), fields(caller = %session.username()))]
    pub async fn list_users(&self, session: &Session) -> Result<Vec<User>, ApplicationError> {
        require(session, Permission::ViewUserData)?;
        self.users.list().await
    }

    /// Users holding the therapist role
    #[instrument(skip(self, session), fields(caller = %session.username()))]
    pub async fn therapists(&self, session: &Session) -> Result<Vec<User>, ApplicationError> {
        require(session, Permission::ViewAllTherapists)?;
        self.users.list_by_role(Role::Therapist).await
    }

    /// Patients linked to a therapist
    ///
    /// A therapist may only list their own patients.
    #[instrument(skip(self, session), fields(caller = %session.username()))]
    pub async fn patients_for(
        &self,
        session: &Session,
        therapist: &str,
    ) -> Result<Vec<User>, ApplicationError> {
        require(session, Permission::ViewAssignedPatients)?;
        let therapist = Username::new(therapist)?;

        if session.role() == Role::Therapist && session.username() != &therapist {
            return Err(ApplicationError::Forbidden(
                "therapists may only view their own patients".to_string(),
            ));
        }

        self.users.patients_of(&therapist).await
    }

    /// Activity counts and recent events of one user
    ///
    /// A therapist may only ask about their own patients.
    #[instrument(skip(self, session), fields(caller = %session.username()))]
    pub async fn progress(
        &self,
        session: &Session,
        username: &str,
    ) -> Result<ProgressReport, ApplicationError> {
        require(session, Permission::ViewProgress)?;
        let username = Username::new(username)?;

        let user = self
            .users
            .find(&username)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("user {username}")))?;

        if session.role() == Role::Therapist && !is_patient_of(&user, session.username()) {
            return Err(ApplicationError::Forbidden(
                "therapists may only view their own patients".to_string(),
            ));
        }

        let counts = self.activity.counts_for(&username).await?;
        let recent = self
            .activity
            .recent_for(&username, RECENT_ACTIVITY_LIMIT)
            .await?;

        Ok(ProgressReport {
            username,
            counts,
            recent,
        })
    }
}
