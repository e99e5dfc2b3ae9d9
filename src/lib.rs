//! Client-side notification core of the news app.
//!
//! This library exposes the internal modules for the CLI, for testing and for
//! embedding in other front ends.

pub mod badge;
pub mod center;
pub mod config;
pub mod local_notifications;
pub mod notifications;
pub mod periodic;
pub mod remote;
pub mod settings;

// Re-export commonly used types for convenience
pub use badge::{BadgeDriver, BadgeOptions};
pub use center::NotificationCenter;
pub use local_notifications::LocalNotificationScheduler;
pub use notifications::{NotificationError, NotificationRecord, NotificationType};
pub use remote::{HttpNotificationsApi, InMemoryNotificationsApi, NotificationsApi};
pub use settings::{NotificationSettings, SettingsSync};
