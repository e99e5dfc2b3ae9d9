//! Fake news API server
//!
//! Serves the notification and profile endpoints from memory on a random
//! port. Each test gets its own server; it shuts down when dropped.

use super::constants::*;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use newsfeed_notifications::settings::{NotificationSettings, UserProfile};
use newsfeed_notifications::{HttpNotificationsApi, NotificationRecord};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Server-side state, shared with the test for inspection and failure
/// injection.
#[derive(Default)]
pub struct FakeNewsApi {
    notifications: Mutex<Vec<NotificationRecord>>,
    settings: Mutex<Option<NotificationSettings>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    mark_all_calls: AtomicUsize,
    mark_one_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeNewsApi {
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn replace_notifications(&self, notifications: Vec<NotificationRecord>) {
        *self.notifications.lock().unwrap() = notifications;
    }

    pub fn settings(&self) -> Option<NotificationSettings> {
        self.settings.lock().unwrap().clone()
    }

    pub fn set_settings(&self, settings: NotificationSettings) {
        *self.settings.lock().unwrap() = Some(settings);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn mark_all_calls(&self) -> usize {
        self.mark_all_calls.load(Ordering::SeqCst)
    }

    pub fn mark_one_calls(&self) -> usize {
        self.mark_one_calls.load(Ordering::SeqCst)
    }

    fn check(&self, headers: &HeaderMap, write: bool) -> Result<(), StatusCode> {
        let expected = format!("Bearer {}", TEST_TOKEN);
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected);
        if !authorized {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let failing = if write {
            &self.fail_writes
        } else {
            &self.fail_reads
        };
        if failing.load(Ordering::SeqCst) {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Ok(())
    }
}

type Shared = State<Arc<FakeNewsApi>>;

async fn list_notifications(State(api): Shared, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    api.check(&headers, false)?;
    Ok(Json(json!({ "notifications": api.notifications() })))
}

async fn mark_read(
    State(api): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    api.mark_one_calls.fetch_add(1, Ordering::SeqCst);
    api.check(&headers, true)?;
    let mut notifications = api.notifications.lock().unwrap();
    match notifications.iter_mut().find(|n| n.id == id) {
        Some(n) => {
            n.read = true;
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn mark_all_read(State(api): Shared, headers: HeaderMap) -> Result<StatusCode, StatusCode> {
    api.mark_all_calls.fetch_add(1, Ordering::SeqCst);
    api.check(&headers, true)?;
    for n in api.notifications.lock().unwrap().iter_mut() {
        n.read = true;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn profile(State(api): Shared, headers: HeaderMap) -> Result<Json<UserProfile>, StatusCode> {
    api.check(&headers, false)?;
    Ok(Json(UserProfile {
        id: Some("user-1".to_string()),
        username: Some("reader".to_string()),
        notification_settings: api.settings(),
    }))
}

async fn update_settings(
    State(api): Shared,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    api.check(&headers, true)?;
    let settings: NotificationSettings = body
        .get("notificationSettings")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    api.set_settings(settings);
    Ok(StatusCode::NO_CONTENT)
}

/// Test server instance
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Server-side state
    pub state: Arc<FakeNewsApi>,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new fake API on a random port, serving `notifications`.
    ///
    /// # Panics
    ///
    /// Panics if the port cannot be bound.
    pub async fn spawn(notifications: Vec<NotificationRecord>) -> Self {
        let state = Arc::new(FakeNewsApi::default());
        state.replace_notifications(notifications);

        let app = Router::new()
            .route("/notifications", get(list_notifications))
            .route("/notifications/read-all", put(mark_all_read))
            .route("/notifications/{id}/read", put(mark_read))
            .route("/users/profile", get(profile))
            .route("/users/settings", put(update_settings))
            .with_state(state.clone());

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// HTTP client pointed at this server, with the accepted token.
    pub fn api(&self) -> Arc<HttpNotificationsApi> {
        Arc::new(
            HttpNotificationsApi::new(
                self.base_url.clone(),
                Some(TEST_TOKEN.to_string()),
                CLIENT_TIMEOUT_SEC,
            )
            .expect("Failed to build API client"),
        )
    }

    /// HTTP client without a token.
    #[allow(dead_code)]
    pub fn anonymous_api(&self) -> Arc<HttpNotificationsApi> {
        Arc::new(
            HttpNotificationsApi::new(self.base_url.clone(), None, CLIENT_TIMEOUT_SEC)
                .expect("Failed to build API client"),
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
