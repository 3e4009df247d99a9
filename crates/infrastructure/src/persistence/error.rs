//! Shared error mapping for sqlx persistence layer

use application::error::ApplicationError;
use chrono::{DateTime, Utc};

/// Map a sqlx error to an application-layer error
pub fn map_sqlx_error(e: sqlx::Error) -> ApplicationError {
    match e {
        sqlx::Error::RowNotFound => {
            ApplicationError::NotFound("Database record not found".to_string())
        },
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApplicationError::DuplicateUser(db_err.message().to_string())
        },
        sqlx::Error::Database(db_err) => {
            ApplicationError::Internal(format!("Database error: {db_err}"))
        },
        other => ApplicationError::Internal(format!("Database error: {other}")),
    }
}

/// Parse a stored RFC 3339 timestamp
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApplicationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApplicationError::Internal(format!("Invalid datetime: {e}")))
}
