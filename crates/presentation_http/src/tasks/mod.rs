//! Background tasks for the HTTP presentation layer

mod rate_limit_cleanup;
mod session_purge;

pub use rate_limit_cleanup::spawn_rate_limit_cleanup_task;
pub use session_purge::spawn_session_purge_task;
