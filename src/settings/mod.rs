//! User notification settings.

mod models;
mod sync;

pub use models::{NotificationSetting, NotificationSettings, UserProfile};
pub use sync::SettingsSync;
