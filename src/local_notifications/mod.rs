//! Local (on-device) notifications: permission handling and one-shot
//! scheduling through the platform SDK.

mod permission;
mod platform;
mod samples;
mod scheduler;

pub use permission::{PermissionGrant, PermissionState};
pub use platform::{
    LocalNotificationContent, NotificationPlatform, NotificationResponse, ScheduleId,
    SimulatedPlatform,
};
pub use samples::{sample_notification, SampleNotification};
pub use scheduler::LocalNotificationScheduler;

#[cfg(feature = "mock")]
pub use platform::MockNotificationPlatform;
