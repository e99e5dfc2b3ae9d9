//! Contract of the platform notification SDK, plus an in-process simulation.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::permission::{PermissionGrant, PermissionState};
use crate::notifications::NotificationRoute;

/// Opaque identifier of a scheduled local notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub String);

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalNotificationContent {
    pub title: String,
    pub body: String,
    /// Opaque routing payload handed back on delivery.
    pub data: serde_json::Value,
}

/// A delivered notification the user interacted with.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationResponse {
    pub schedule_id: ScheduleId,
    pub content: LocalNotificationContent,
}

impl NotificationResponse {
    pub fn route(&self) -> NotificationRoute {
        NotificationRoute::from_payload(&self.content.data)
    }
}

/// Platform notification SDK surface.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    async fn get_permission(&self) -> Result<PermissionState>;

    async fn request_permission(&self) -> Result<PermissionState>;

    /// Deliver `content` once after `trigger_delay`. Requires a granted
    /// permission.
    async fn schedule_one_shot(
        &self,
        grant: PermissionGrant,
        content: LocalNotificationContent,
        trigger_delay: Duration,
    ) -> Result<ScheduleId>;

    /// Listen for responses to delivered notifications. Dropping the receiver
    /// unsubscribes.
    fn subscribe_responses(&self) -> broadcast::Receiver<NotificationResponse>;
}

/// In-process platform: permission answers are scripted and deliveries are
/// tokio timers that respond as if the user tapped the notification.
pub struct SimulatedPlatform {
    permission: Mutex<PermissionState>,
    /// Answer to the next permission request.
    request_answer: Mutex<PermissionState>,
    fail_scheduling: AtomicBool,
    permission_requests: AtomicUsize,
    scheduled: AtomicUsize,
    responses: broadcast::Sender<NotificationResponse>,
}

impl SimulatedPlatform {
    pub fn new(permission: PermissionState, request_answer: PermissionState) -> Self {
        let (responses, _) = broadcast::channel(64);
        Self {
            permission: Mutex::new(permission),
            request_answer: Mutex::new(request_answer),
            fail_scheduling: AtomicBool::new(false),
            permission_requests: AtomicUsize::new(0),
            scheduled: AtomicUsize::new(0),
            responses,
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionState::Granted, PermissionState::Granted)
    }

    pub fn set_fail_scheduling(&self, fail: bool) {
        self.fail_scheduling.store(fail, Ordering::SeqCst);
    }

    pub fn set_request_answer(&self, answer: PermissionState) {
        *lock(&self.request_answer) = answer;
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl NotificationPlatform for SimulatedPlatform {
    async fn get_permission(&self) -> Result<PermissionState> {
        Ok(*lock(&self.permission))
    }

    async fn request_permission(&self) -> Result<PermissionState> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        let answer = *lock(&self.request_answer);
        *lock(&self.permission) = answer;
        debug!("Simulated permission request answered {:?}", answer);
        Ok(answer)
    }

    async fn schedule_one_shot(
        &self,
        _grant: PermissionGrant,
        content: LocalNotificationContent,
        trigger_delay: Duration,
    ) -> Result<ScheduleId> {
        if self.fail_scheduling.load(Ordering::SeqCst) {
            bail!("Simulated platform refused to schedule");
        }

        let schedule_id = ScheduleId(uuid::Uuid::new_v4().to_string());
        self.scheduled.fetch_add(1, Ordering::SeqCst);

        let responses = self.responses.clone();
        let response = NotificationResponse {
            schedule_id: schedule_id.clone(),
            content,
        };
        tokio::spawn(async move {
            tokio::time::sleep(trigger_delay).await;
            info!(
                "Delivering local notification {}: {}",
                response.schedule_id, response.content.title
            );
            // No listeners is not an error: the notification was still shown.
            let _ = responses.send(response);
        });

        Ok(schedule_id)
    }

    fn subscribe_responses(&self) -> broadcast::Receiver<NotificationResponse> {
        self.responses.subscribe()
    }
}
