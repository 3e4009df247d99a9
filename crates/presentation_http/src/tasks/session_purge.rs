//! Idle session purge task
//!
//! Resolving a session already rejects idle ones; this task frees the
//! memory of sessions nobody comes back for.

use std::{sync::Arc, time::Duration};

use application::SessionResolver;
use tracing::{debug, error, info};

/// Spawn a task that purges idle sessions every `interval`
///
/// Abort the returned handle on shutdown.
pub fn spawn_session_purge_task(
    sessions: Arc<SessionResolver>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting session purge task");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => debug!("No idle sessions to purge"),
                Ok(purged) => info!(purged, "Purged idle sessions"),
                Err(e) => error!(error = %e, "Failed to purge idle sessions"),
            }
        }
    })
}
