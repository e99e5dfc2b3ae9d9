//! In-process implementation of the news API.
//!
//! Backs the CLI's `--demo` mode and the test suites. Failures can be injected
//! per endpoint, and write calls can be held pending to exercise in-flight
//! behavior.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

use super::NotificationsApi;
use crate::notifications::{NotificationRecord, NotificationType};
use crate::settings::{NotificationSettings, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    FetchNotifications,
    MarkOne,
    MarkAll,
    FetchProfile,
    UpdateSettings,
}

impl Endpoint {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        match self {
            Self::FetchNotifications => 0,
            Self::MarkOne => 1,
            Self::MarkAll => 2,
            Self::FetchProfile => 3,
            Self::UpdateSettings => 4,
        }
    }
}

pub struct InMemoryNotificationsApi {
    notifications: Mutex<Vec<NotificationRecord>>,
    profile: Mutex<UserProfile>,
    failing: [AtomicBool; Endpoint::COUNT],
    calls: [AtomicUsize; Endpoint::COUNT],
    writes_held: watch::Sender<bool>,
}

impl InMemoryNotificationsApi {
    pub fn new(notifications: Vec<NotificationRecord>) -> Self {
        let (writes_held, _) = watch::channel(false);
        Self {
            notifications: Mutex::new(notifications),
            profile: Mutex::new(UserProfile::default()),
            failing: Default::default(),
            calls: Default::default(),
            writes_held,
        }
    }

    /// A small feed covering every category, used by the CLI demo mode.
    pub fn with_demo_feed() -> Self {
        let notifications = NotificationType::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| NotificationRecord {
                id: format!("demo-{}", i + 1),
                notification_type: *t,
                read: i % 3 == 2,
                title: format!("Sample {} notification", t),
                message: None,
                reference_id: Some(serde_json::json!(100 + i)),
                reference_type: Some(t.to_string()),
                action: (*t == NotificationType::Profile).then(|| "follow".to_string()),
                action_type: None,
                created_at: None,
            })
            .collect();
        Self::new(notifications)
    }

    pub fn set_failing(&self, endpoint: Endpoint, failing: bool) {
        self.failing[endpoint.index()].store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls[endpoint.index()].load(Ordering::SeqCst)
    }

    /// Keep mark-read and settings calls pending until [`Self::release_writes`].
    pub fn hold_writes(&self) {
        self.writes_held.send_replace(true);
    }

    pub fn release_writes(&self) {
        self.writes_held.send_replace(false);
    }

    /// Replace the server-side list, e.g. to simulate activity elsewhere.
    pub fn replace_notifications(&self, notifications: Vec<NotificationRecord>) {
        *lock(&self.notifications) = notifications;
    }

    pub fn server_notifications(&self) -> Vec<NotificationRecord> {
        lock(&self.notifications).clone()
    }

    pub fn set_profile(&self, profile: UserProfile) {
        *lock(&self.profile) = profile;
    }

    fn enter(&self, endpoint: Endpoint) -> Result<()> {
        self.calls[endpoint.index()].fetch_add(1, Ordering::SeqCst);
        if self.failing[endpoint.index()].load(Ordering::SeqCst) {
            bail!("{:?} unavailable", endpoint);
        }
        Ok(())
    }

    async fn wait_for_release(&self) {
        let mut held = self.writes_held.subscribe();
        // The sender lives in self, so the channel cannot close while we wait.
        let _ = held.wait_for(|held| !*held).await;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl NotificationsApi for InMemoryNotificationsApi {
    async fn fetch_notifications(&self) -> Result<Vec<NotificationRecord>> {
        self.enter(Endpoint::FetchNotifications)?;
        Ok(lock(&self.notifications).clone())
    }

    async fn mark_notification_as_read(&self, id: &str) -> Result<()> {
        self.calls[Endpoint::MarkOne.index()].fetch_add(1, Ordering::SeqCst);
        self.wait_for_release().await;
        if self.failing[Endpoint::MarkOne.index()].load(Ordering::SeqCst) {
            bail!("MarkOne unavailable");
        }
        let mut notifications = lock(&self.notifications);
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => n.read = true,
            None => bail!("Notification {} not found", id),
        }
        Ok(())
    }

    async fn mark_all_notifications_as_read(&self) -> Result<()> {
        self.calls[Endpoint::MarkAll.index()].fetch_add(1, Ordering::SeqCst);
        self.wait_for_release().await;
        if self.failing[Endpoint::MarkAll.index()].load(Ordering::SeqCst) {
            bail!("MarkAll unavailable");
        }
        for n in lock(&self.notifications).iter_mut() {
            n.read = true;
        }
        Ok(())
    }

    async fn fetch_user_profile(&self) -> Result<UserProfile> {
        self.enter(Endpoint::FetchProfile)?;
        Ok(lock(&self.profile).clone())
    }

    async fn update_user_settings(&self, settings: &NotificationSettings) -> Result<()> {
        self.calls[Endpoint::UpdateSettings.index()].fetch_add(1, Ordering::SeqCst);
        self.wait_for_release().await;
        if self.failing[Endpoint::UpdateSettings.index()].load(Ordering::SeqCst) {
            bail!("UpdateSettings unavailable");
        }
        lock(&self.profile).notification_settings = Some(settings.clone());
        Ok(())
    }
}
