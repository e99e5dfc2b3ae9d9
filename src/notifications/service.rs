//! Service-boundary helpers over the remote API.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::badge::UnreadCountSource;
use crate::remote::NotificationsApi;

/// Thin wrapper around the remote API for callers that do not hold the full
/// list, such as the badge.
pub struct NotificationService {
    api: Arc<dyn NotificationsApi>,
}

impl NotificationService {
    pub fn new(api: Arc<dyn NotificationsApi>) -> Self {
        Self { api }
    }

    /// Number of unread notifications, derived from a full fetch.
    ///
    /// Fails open: any error is logged and reported as zero.
    pub async fn get_unread_count(&self) -> u64 {
        match self.fetch_unread_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to fetch unread notification count: {:#}", e);
                0
            }
        }
    }

    async fn fetch_unread_count(&self) -> anyhow::Result<u64> {
        let notifications = self.api.fetch_notifications().await?;
        Ok(notifications.iter().filter(|n| !n.read).count() as u64)
    }
}

#[async_trait]
impl UnreadCountSource for NotificationService {
    async fn unread_count(&self) -> anyhow::Result<u64> {
        self.fetch_unread_count().await
    }
}


#[cfg(all(test, feature = "mock"))]
mod mock_tests {
    use super::*;
    use crate::notifications::{NotificationRecord, NotificationType};
    use crate::remote::MockNotificationsApi;

    fn record(id: &str, read: bool) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            notification_type: NotificationType::Comment,
            read,
            title: String::new(),
            message: None,
            reference_id: None,
            reference_type: None,
            action: None,
            action_type: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_unread_count_uses_single_fetch() {
        let mut api = MockNotificationsApi::new();
        api.expect_fetch_notifications()
            .times(1)
            .returning(|| Ok(vec![record("a", false), record("b", true), record("c", false)]));
        let service = NotificationService::new(Arc::new(api));

        assert_eq!(service.get_unread_count().await, 2);
    }
}
