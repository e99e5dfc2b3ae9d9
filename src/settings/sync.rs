use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::models::{NotificationSetting, NotificationSettings};
use crate::notifications::{NotificationError, NotificationType};
use crate::remote::NotificationsApi;

/// Keeps the local copy of the user's notification settings in line with the
/// server.
pub struct SettingsSync {
    api: Arc<dyn NotificationsApi>,
    current: Mutex<NotificationSettings>,
}

impl SettingsSync {
    pub fn new(api: Arc<dyn NotificationsApi>) -> Self {
        Self {
            api,
            current: Mutex::new(NotificationSettings::default()),
        }
    }

    pub fn current(&self) -> NotificationSettings {
        self.lock().clone()
    }

    /// Whether notifications of this category reach the user under the
    /// current settings.
    pub fn allows(&self, notification_type: NotificationType) -> bool {
        self.lock().allows(notification_type)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NotificationSettings> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load settings from the user profile. A profile without settings leaves
    /// the defaults in place.
    pub async fn hydrate(&self) -> Result<NotificationSettings, NotificationError> {
        let profile = self
            .api
            .fetch_user_profile()
            .await
            .map_err(NotificationError::Fetch)?;

        let mut current = self.lock();
        if let Some(settings) = profile.notification_settings {
            *current = settings;
        }
        info!("Notification settings hydrated: {:?}", *current);
        Ok(current.clone())
    }

    /// Change one setting, optimistically. The full record is sent to the
    /// server; on failure the previous value of that setting is restored.
    pub async fn update(&self, setting: NotificationSetting) -> Result<NotificationSettings, NotificationError> {
        let (previous, updated) = {
            let mut current = self.lock();
            let previous = current.get(setting.key());
            current.apply(setting);
            (previous, current.clone())
        };

        match self.api.update_user_settings(&updated).await {
            Ok(()) => Ok(updated),
            Err(e) => {
                warn!("Failed to update setting {}: {:#}", setting.key(), e);
                if let Some(previous) = previous {
                    let mut current = self.lock();
                    // Leave it alone if a later update already changed it.
                    if current.get(setting.key()) == Some(setting) {
                        current.apply(previous);
                    }
                }
                Err(NotificationError::reconciliation("update settings", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{Endpoint, InMemoryNotificationsApi};
    use crate::settings::UserProfile;

    #[tokio::test]
    async fn test_hydrate_from_profile() {
        let api = Arc::new(InMemoryNotificationsApi::new(vec![]));
        api.set_profile(UserProfile {
            id: Some("u1".to_string()),
            username: None,
            notification_settings: Some(NotificationSettings {
                enable_like: false,
                ..Default::default()
            }),
        });
        let sync = SettingsSync::new(api);

        let settings = sync.hydrate().await.unwrap();
        assert!(!settings.enable_like);
        assert_eq!(sync.current(), settings);
    }

    #[tokio::test]
    async fn test_allows_follows_hydrated_settings() {
        let api = Arc::new(InMemoryNotificationsApi::new(vec![]));
        api.set_profile(UserProfile {
            id: Some("u1".to_string()),
            username: None,
            notification_settings: Some(NotificationSettings {
                enable_stream: false,
                ..Default::default()
            }),
        });
        let sync = SettingsSync::new(api);
        assert!(sync.allows(NotificationType::Stream));

        sync.hydrate().await.unwrap();
        assert!(!sync.allows(NotificationType::Stream));
        assert!(sync.allows(NotificationType::News));

        sync.update(NotificationSetting::PushEnabled(false)).await.unwrap();
        assert!(!sync.allows(NotificationType::System));
    }

    #[tokio::test]
    async fn test_hydrate_failure_keeps_current() {
        let api = Arc::new(InMemoryNotificationsApi::new(vec![]));
        api.set_failing(Endpoint::FetchProfile, true);
        let sync = SettingsSync::new(api);

        assert!(matches!(sync.hydrate().await, Err(NotificationError::Fetch(_))));
        assert_eq!(sync.current(), NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_update_persists_full_record() {
        let api = Arc::new(InMemoryNotificationsApi::new(vec![]));
        let sync = SettingsSync::new(api.clone());

        sync.update(NotificationSetting::StreamEnabled(false)).await.unwrap();

        let stored = api.fetch_user_profile().await.unwrap().notification_settings.unwrap();
        assert!(!stored.enable_stream);
        assert!(stored.enable_news);
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back() {
        let api = Arc::new(InMemoryNotificationsApi::new(vec![]));
        api.set_failing(Endpoint::UpdateSettings, true);
        let sync = SettingsSync::new(api);

        let result = sync.update(NotificationSetting::PushEnabled(false)).await;

        assert!(result.is_err());
        assert!(sync.current().enable_push);
    }
}
