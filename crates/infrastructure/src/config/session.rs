//! Session lifetime configuration.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle for longer than this are rejected and purged
    #[serde(default = "default_idle_timeout_hours")]
    pub idle_timeout_hours: u32,

    /// How often the purge task runs, in seconds
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

const fn default_idle_timeout_hours() -> u32 {
    8
}

const fn default_purge_interval() -> u64 {
    600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_hours: default_idle_timeout_hours(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.idle_timeout_hours))
    }
}
