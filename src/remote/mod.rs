//! Contract for the remote news API consumed by the notification core.

mod client;
mod in_memory;

pub use client::HttpNotificationsApi;
pub use in_memory::{Endpoint, InMemoryNotificationsApi};

use anyhow::Result;
use async_trait::async_trait;

use crate::notifications::NotificationRecord;
use crate::settings::{NotificationSettings, UserProfile};

/// Remote endpoints the core depends on.
///
/// Every call may fail on transport or server errors; none of them carry a
/// timeout beyond what the implementation configures.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait NotificationsApi: Send + Sync {
    /// Fetch the full notification list, in server order.
    async fn fetch_notifications(&self) -> Result<Vec<NotificationRecord>>;

    /// Confirm a single notification as read.
    async fn mark_notification_as_read(&self, id: &str) -> Result<()>;

    /// Confirm every notification of the user as read.
    async fn mark_all_notifications_as_read(&self) -> Result<()>;

    /// Fetch the current user's profile, including notification settings.
    async fn fetch_user_profile(&self) -> Result<UserProfile>;

    /// Persist the notification settings record.
    async fn update_user_settings(&self, settings: &NotificationSettings) -> Result<()>;
}
