//! Activity log stored with sqlx

use application::{
    error::ApplicationError,
    ports::{ActivityCount, ActivityLogPort},
};
use async_trait::async_trait;
use chrono::SecondsFormat;
use domain::{ActivityEvent, Username};
use sqlx::AnyPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::error::{map_sqlx_error, parse_datetime};

/// sqlx-backed activity log
#[derive(Debug, Clone)]
pub struct SqlxActivityLog {
    pool: AnyPool,
}

impl SqlxActivityLog {
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogPort for SqlxActivityLog {
    #[instrument(skip(self, event), fields(username = %event.username, event_type = %event.event_type))]
    async fn record(&self, event: &ActivityEvent) -> Result<(), ApplicationError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| ApplicationError::Internal(format!("Invalid payload: {e}")))?;

        sqlx::query(
            "INSERT INTO activity_logs (id, username, event_type, payload, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.id.to_string())
        .bind(event.username.as_str().to_string())
        .bind(event.event_type.as_str())
        .bind(payload)
        .bind(event.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!("Activity recorded");
        Ok(())
    }

    #[instrument(skip(self), fields(username = %username))]
    async fn counts_for(&self, username: &Username) -> Result<Vec<ActivityCount>, ApplicationError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT event_type, COUNT(*) FROM activity_logs \
             WHERE username = $1 GROUP BY event_type ORDER BY event_type",
        )
        .bind(username.as_str().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|(event_type, count)| {
                Ok(ActivityCount {
                    event_type: event_type.parse()?,
                    count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(username = %username))]
    async fn recent_for(
        &self,
        username: &Username,
        limit: u32,
    ) -> Result<Vec<ActivityEvent>, ApplicationError> {
        let rows: Vec<ActivityRow> = sqlx::query_as(
            "SELECT id, username, event_type, payload, created_at FROM activity_logs \
             WHERE username = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(username.as_str().to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ActivityRow::into_event).collect()
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: String,
    username: String,
    event_type: String,
    payload: String,
    created_at: String,
}

impl ActivityRow {
    fn into_event(self) -> Result<ActivityEvent, ApplicationError> {
        Ok(ActivityEvent {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| ApplicationError::Internal(format!("Invalid UUID: {e}")))?,
            username: Username::new(&self.username)?,
            event_type: self.event_type.parse()?,
            // a corrupt payload should not hide the rest of the history
            payload: serde_json::from_str(&self.payload).unwrap_or_default(),
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}
