//! Persistence module
//!
//! sqlx-based storage for user accounts and the activity log.

pub mod activity_log;
pub mod async_connection;
pub mod database_health;
pub(crate) mod error;
pub mod user_store;

pub use activity_log::SqlxActivityLog;
pub use async_connection::{
    AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError, DatabaseBackend,
};
pub use database_health::SqlxDatabaseHealth;
pub use error::map_sqlx_error;
pub use user_store::SqlxUserStore;
