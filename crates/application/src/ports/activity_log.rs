//! Port for the per-user activity log
//!
//! Records what a user did during practice so therapists and managers can
//! follow progress.

use async_trait::async_trait;
use domain::{ActivityEvent, ActivityEventType, Username};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::error::ApplicationError;

/// Number of events of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityCount {
    pub event_type: ActivityEventType,
    pub count: u64,
}

/// Port for activity log storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActivityLogPort: Send + Sync {
    /// Record an activity event
    async fn record(&self, event: &ActivityEvent) -> Result<(), ApplicationError>;

    /// Count events per type for one user
    async fn counts_for(&self, username: &Username) -> Result<Vec<ActivityCount>, ApplicationError>;

    /// Most recent events of one user, newest first
    async fn recent_for(
        &self,
        username: &Username,
        limit: u32,
    ) -> Result<Vec<ActivityEvent>, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn ActivityLogPort) {}

    #[test]
    fn count_serializes_event_type_snake_case() {
        let count = ActivityCount {
            event_type: ActivityEventType::AssistantReply,
            count: 3,
        };
        let json = serde_json::to_value(&count).unwrap();
        assert_eq!(json["event_type"], "assistant_reply");
        assert_eq!(json["count"], 3);
    }
}
