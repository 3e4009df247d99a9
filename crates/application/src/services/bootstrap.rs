//! First-start seeding of a developer account
//!
//! An empty user store gets exactly one developer so the system can be
//! administered. Once any user exists the seeder does nothing.

use std::{fmt, sync::Arc};

use domain::{Role, User, Username, check_password_policy};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use super::credential_service::CredentialService;
use crate::{error::ApplicationError, ports::UserStore};

pub const DEFAULT_BOOTSTRAP_USERNAME: &str = "devadmin";
pub const DEFAULT_BOOTSTRAP_PASSWORD: &str = "changeme123";
pub const DEFAULT_BOOTSTRAP_DISPLAY_NAME: &str = "Developer Admin";

/// The account created on an empty store
#[derive(Debug, Clone)]
pub struct BootstrapAccount {
    pub username: String,
    pub password: SecretString,
    pub display_name: String,
}

impl Default for BootstrapAccount {
    fn default() -> Self {
        Self {
            username: DEFAULT_BOOTSTRAP_USERNAME.to_string(),
            password: SecretString::from(DEFAULT_BOOTSTRAP_PASSWORD.to_string()),
            display_name: DEFAULT_BOOTSTRAP_DISPLAY_NAME.to_string(),
        }
    }
}

/// Result of a seeding attempt
#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    /// The store was empty and the developer account was created
    Created(User),
    /// At least one user existed already
    AlreadyInitialized,
}

impl BootstrapOutcome {
    pub const fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Seeds the developer account on first start
pub struct BootstrapSeeder {
    users: Arc<dyn UserStore>,
    credentials: Arc<CredentialService>,
    account: BootstrapAccount,
}

impl fmt::Debug for BootstrapSeeder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapSeeder")
            .field("username", &self.account.username)
            .finish_non_exhaustive()
    }
}

impl BootstrapSeeder {
    pub fn new(
        users: Arc<dyn UserStore>,
        credentials: Arc<CredentialService>,
        account: BootstrapAccount,
    ) -> Self {
        Self {
            users,
            credentials,
            account,
        }
    }

    /// Create the developer account if, and only if, no user exists
    ///
    /// Safe to call from several processes at once: the final insert is
    /// conditional on the store being empty.
    #[instrument(skip(self), fields(username = %self.account.username))]
    pub async fn seed(&self) -> Result<BootstrapOutcome, ApplicationError> {
        if self.users.count().await? > 0 {
            return Ok(BootstrapOutcome::AlreadyInitialized);
        }

        let username = Username::new_local(&self.account.username)?;
        check_password_policy(self.account.password.expose_secret())?;

        let password_hash = self
            .credentials
            .hash_password(self.account.password.clone())
            .await?;
        let user = User::new_local(
            username,
            password_hash,
            Role::Developer,
            Some(self.account.display_name.clone()),
            None,
        )?;

        if self.users.insert_if_empty(&user).await? {
            if self.account.password.expose_secret() == DEFAULT_BOOTSTRAP_PASSWORD {
                warn!("Bootstrap account uses the default password; change it after first login");
            }
            info!(username = %user.username(), "Bootstrap developer account created");
            Ok(BootstrapOutcome::Created(user))
        } else {
            info!("Another process initialized the user store first");
            Ok(BootstrapOutcome::AlreadyInitialized)
        }
    }
}
