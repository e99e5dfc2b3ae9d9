use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::permission::PermissionState;
use super::platform::{LocalNotificationContent, NotificationPlatform, ScheduleId};
use crate::notifications::NotificationError;

/// Schedules one-shot local notifications, asking for permission first.
pub struct LocalNotificationScheduler {
    platform: Arc<dyn NotificationPlatform>,
    permission: Mutex<PermissionState>,
}

impl LocalNotificationScheduler {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self {
            platform,
            permission: Mutex::new(PermissionState::Undetermined),
        }
    }

    pub fn platform(&self) -> &Arc<dyn NotificationPlatform> {
        &self.platform
    }

    /// Last permission state observed this session.
    pub fn permission(&self) -> PermissionState {
        *self.lock_permission()
    }

    fn lock_permission(&self) -> std::sync::MutexGuard<'_, PermissionState> {
        self.permission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn observe(&self, f: impl FnOnce(PermissionState) -> PermissionState) -> PermissionState {
        let mut permission = self.lock_permission();
        *permission = f(*permission);
        *permission
    }

    /// Make sure permission is granted, asking the platform if needed.
    ///
    /// Once granted, the platform is not asked again this session. A denied
    /// verdict is re-requested on every call, the platform may keep it denied.
    /// Platform errors count as "not granted".
    pub async fn ensure_permission(&self) -> PermissionState {
        if !self.permission().needs_request() {
            return PermissionState::Granted;
        }

        match self.platform.get_permission().await {
            Ok(reported) => {
                if self.observe(|s| s.after_report(reported)) == PermissionState::Granted {
                    return PermissionState::Granted;
                }
            }
            Err(e) => warn!("Failed to read notification permission: {:#}", e),
        }

        match self.platform.request_permission().await {
            Ok(reported) => {
                let state = self.observe(|s| s.after_request(reported));
                info!("Notification permission after request: {:?}", state);
                state
            }
            Err(e) => {
                warn!("Notification permission request failed: {:#}", e);
                self.permission()
            }
        }
    }

    /// Schedule a one-shot local notification after `delay_seconds`.
    ///
    /// Returns `Ok(None)` when permission is not granted. Fails with
    /// [`NotificationError::Validation`] on an empty title or body, before
    /// permission is looked at, and with [`NotificationError::Scheduling`]
    /// when the platform call itself fails.
    pub async fn schedule(
        &self,
        title: &str,
        body: &str,
        data: serde_json::Value,
        delay_seconds: u64,
    ) -> Result<Option<ScheduleId>, NotificationError> {
        if title.trim().is_empty() {
            return Err(NotificationError::Validation(
                "title must not be empty".to_string(),
            ));
        }
        if body.trim().is_empty() {
            return Err(NotificationError::Validation(
                "body must not be empty".to_string(),
            ));
        }

        let Some(grant) = self.ensure_permission().await.grant() else {
            info!("Local notification not scheduled: permission not granted");
            return Ok(None);
        };

        let content = LocalNotificationContent {
            title: title.to_string(),
            body: body.to_string(),
            data,
        };
        let schedule_id = self
            .platform
            .schedule_one_shot(grant, content, Duration::from_secs(delay_seconds))
            .await
            .map_err(NotificationError::Scheduling)?;

        debug!(
            "Scheduled local notification {} in {}s",
            schedule_id, delay_seconds
        );
        Ok(Some(schedule_id))
    }
}
