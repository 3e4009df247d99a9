//! Database-backed administration commands

use std::{fmt::Write as _, sync::Arc};

use application::{
    BootstrapAccount, BootstrapOutcome, BootstrapSeeder, CredentialService, NewLocalUser,
    ports::UserStore,
};
use domain::User;
use infrastructure::{
    AppConfig, Argon2PasswordHasher, AsyncDatabase, AsyncDatabaseConfig, SqlxUserStore,
};
use tracing::info;

/// Direct access to the user store, bypassing the HTTP server
pub struct Admin {
    database: AsyncDatabase,
    users: Arc<SqlxUserStore>,
    credentials: Arc<CredentialService>,
}

impl Admin {
    /// Open the configured database, migrating it when enabled
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let database = AsyncDatabase::new(&AsyncDatabaseConfig::with_url(
            config.database_url(),
            config.database.max_connections,
        ))
        .await?;
        if config.database.run_migrations {
            database.migrate().await?;
        }
        info!(backend = ?database.backend(), "Connected to database");
        Ok(Self::with_database(database))
    }

    pub fn with_database(database: AsyncDatabase) -> Self {
        let users = Arc::new(SqlxUserStore::new(database.pool().clone()));
        let credentials = Arc::new(CredentialService::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::new(Argon2PasswordHasher::new()),
        ));
        Self {
            database,
            users,
            credentials,
        }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        self.database.migrate().await?;
        Ok(())
    }

    /// Create the developer account when the store is empty
    pub async fn seed(&self, account: BootstrapAccount) -> anyhow::Result<BootstrapOutcome> {
        let seeder = BootstrapSeeder::new(
            Arc::clone(&self.users) as Arc<dyn UserStore>,
            Arc::clone(&self.credentials),
            account,
        );
        Ok(seeder.seed().await?)
    }

    pub async fn create_user(&self, new_user: NewLocalUser) -> anyhow::Result<User> {
        Ok(self.credentials.create_local_user(new_user).await?)
    }

    pub async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.list().await?)
    }

    pub async fn close(self) {
        self.database.pool().close().await;
    }
}

/// Plain-text table of users, one per line
pub fn user_table(users: &[User]) -> String {
    let width = users
        .iter()
        .map(|u| u.username().as_str().len())
        .max()
        .unwrap_or(0)
        .max("USERNAME".len());

    let mut out = format!("{:<width$}  {:<9}  {:<9}  THERAPIST\n", "USERNAME", "ROLE", "AUTH");
    for user in users {
        let _ = writeln!(
            out,
            "{:<width$}  {:<9}  {:<9}  {}",
            user.username().as_str(),
            user.role().as_str(),
            user.auth_method().to_string(),
            user.therapist().map_or("-", |t| t.as_str()),
        );
    }
    out
}
