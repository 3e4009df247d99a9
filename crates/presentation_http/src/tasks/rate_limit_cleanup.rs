//! Drops rate limiter buckets of clients that went quiet

use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::middleware::RateLimiterState;

/// Spawn a task that drops buckets idle for longer than `interval`
pub fn spawn_rate_limit_cleanup_task(
    state: Arc<RateLimiterState>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = state.cleanup(interval).await;
            if removed > 0 {
                debug!(removed, "Dropped idle rate limit buckets");
            }
        }
    })
}
