//! User accounts stored with sqlx
//!
//! Timestamps are RFC 3339 text so the same schema works on SQLite and
//! PostgreSQL through the `Any` driver.

use application::{error::ApplicationError, ports::UserStore};
use async_trait::async_trait;
use chrono::SecondsFormat;
use domain::{AuthMethod, Role, User, Username};
use sqlx::AnyPool;
use tracing::{debug, instrument};

use super::error::{map_sqlx_error, parse_datetime};

const USER_COLUMNS: &str =
    "username, display_name, role, auth_source, password_hash, therapist_username, created_at";

/// sqlx-backed user store
#[derive(Debug, Clone)]
pub struct SqlxUserStore {
    pool: AnyPool,
}

impl SqlxUserStore {
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    fn sorted(mut users: Vec<User>) -> Vec<User> {
        users.sort_by(|a, b| {
            a.role()
                .cmp(&b.role())
                .then_with(|| a.username().cmp(b.username()))
        });
        users
    }

    async fn fetch_many(
        &self,
        sql: &str,
        arg: Option<&str>,
    ) -> Result<Vec<User>, ApplicationError> {
        let mut query = sqlx::query_as::<_, UserRow>(sql);
        if let Some(arg) = arg {
            query = query.bind(arg.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::sorted(users))
    }
}

#[async_trait]
impl UserStore for SqlxUserStore {
    #[instrument(skip(self), fields(username = %username))]
    async fn find(&self, username: &Username) -> Result<Option<User>, ApplicationError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username.as_str().to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(UserRow::into_user).transpose()
    }

    #[instrument(skip(self, user), fields(username = %user.username()))]
    async fn insert(&self, user: &User) -> Result<(), ApplicationError> {
        let row = UserRow::from(user);
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(row.username)
        .bind(row.display_name)
        .bind(row.role)
        .bind(row.auth_source)
        .bind(row.password_hash)
        .bind(row.therapist_username)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            ApplicationError::DuplicateUser(_) => {
                ApplicationError::DuplicateUser(user.username().to_string())
            },
            other => other,
        })?;

        debug!("User inserted");
        Ok(())
    }

    #[instrument(skip(self, user), fields(username = %user.username(), role = %user.role()))]
    async fn upsert_directory_user(&self, user: &User) -> Result<User, ApplicationError> {
        let row = UserRow::from(user);
        // only directory rows are refreshed; a local account with the same
        // name is left untouched and reported below
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (username) DO UPDATE SET \
                 role = excluded.role, \
                 display_name = excluded.display_name \
             WHERE users.auth_source = 'sso'"
        ))
        .bind(row.username)
        .bind(row.display_name)
        .bind(row.role)
        .bind(row.auth_source)
        .bind(row.password_hash)
        .bind(row.therapist_username)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let stored = self
            .find(user.username())
            .await?
            .ok_or_else(|| ApplicationError::Internal("directory user vanished".to_string()))?;

        if stored.auth_method() != AuthMethod::Directory {
            return Err(ApplicationError::DuplicateUser(user.username().to_string()));
        }

        debug!("Directory user upserted");
        Ok(stored)
    }

    #[instrument(skip(self, password_hash), fields(username = %username))]
    async fn update_password_hash(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<(), ApplicationError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1 WHERE username = $2 AND auth_source = 'local'",
        )
        .bind(password_hash.to_string())
        .bind(username.as_str().to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(ApplicationError::NotFound(format!(
                "local user {username}"
            )));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, ApplicationError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[instrument(skip(self, user), fields(username = %user.username()))]
    async fn insert_if_empty(&self, user: &User) -> Result<bool, ApplicationError> {
        let row = UserRow::from(user);
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             SELECT $1, $2, $3, $4, $5, $6, $7 \
             WHERE NOT EXISTS (SELECT 1 FROM users) \
             ON CONFLICT (username) DO NOTHING"
        ))
        .bind(row.username)
        .bind(row.display_name)
        .bind(row.role)
        .bind(row.auth_source)
        .bind(row.password_hash)
        .bind(row.therapist_username)
        .bind(row.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        let inserted = result.rows_affected() == 1;
        debug!(inserted, "Conditional insert finished");
        Ok(inserted)
    }

    async fn list(&self) -> Result<Vec<User>, ApplicationError> {
        self.fetch_many(&format!("SELECT {USER_COLUMNS} FROM users"), None)
            .await
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, ApplicationError> {
        self.fetch_many(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1"),
            Some(role.as_str()),
        )
        .await
    }

    async fn patients_of(&self, therapist: &Username) -> Result<Vec<User>, ApplicationError> {
        self.fetch_many(
            &format!(
                "SELECT {USER_COLUMNS} FROM users \
                 WHERE therapist_username = $1 AND role = 'patient'"
            ),
            Some(therapist.as_str()),
        )
        .await
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    username: String,
    display_name: String,
    role: String,
    auth_source: String,
    password_hash: Option<String>,
    therapist_username: Option<String>,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, ApplicationError> {
        let therapist = self
            .therapist_username
            .as_deref()
            .map(Username::new)
            .transpose()?;

        Ok(User::restore(
            Username::new(&self.username)?,
            self.display_name,
            self.role.parse()?,
            self.auth_source.parse()?,
            self.password_hash,
            therapist,
            parse_datetime(&self.created_at)?,
        )?)
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            username: user.username().to_string(),
            display_name: user.display_name().to_string(),
            role: user.role().as_str().to_string(),
            auth_source: user.auth_method().storage_key().to_string(),
            password_hash: user.password_hash().map(str::to_string),
            therapist_username: user.therapist().map(ToString::to_string),
            created_at: user.created_at().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}
