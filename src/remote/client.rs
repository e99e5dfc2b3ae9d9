//! HTTP client for the news API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::NotificationsApi;
use crate::notifications::NotificationRecord;
use crate::settings::{NotificationSettings, UserProfile};

/// The list endpoint has been observed answering both with a bare array and
/// with a wrapping object.
#[derive(Deserialize)]
#[serde(untagged)]
enum NotificationListResponse {
    Bare(Vec<NotificationRecord>),
    Wrapped { notifications: Vec<NotificationRecord> },
}

impl From<NotificationListResponse> for Vec<NotificationRecord> {
    fn from(response: NotificationListResponse) -> Self {
        match response {
            NotificationListResponse::Bare(list) => list,
            NotificationListResponse::Wrapped { notifications } => notifications,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSettingsBody<'a> {
    notification_settings: &'a NotificationSettings,
}

/// HTTP client for communicating with the news API.
pub struct HttpNotificationsApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpNotificationsApi {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API (e.g., "https://api.example.com/v1")
    /// * `token` - Optional bearer token sent with every request
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, token: Option<String>, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .with_context(|| format!("Failed to {}", what))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to {}: status {}", what, response.status());
        }
        Ok(response)
    }
}

#[async_trait]
impl NotificationsApi for HttpNotificationsApi {
    async fn fetch_notifications(&self) -> Result<Vec<NotificationRecord>> {
        let request = self.client.get(self.url("/notifications"));
        let response = self.send(request, "fetch notifications").await?;

        let list: NotificationListResponse = response
            .json()
            .await
            .context("Failed to parse notifications response")?;
        Ok(list.into())
    }

    async fn mark_notification_as_read(&self, id: &str) -> Result<()> {
        let request = self
            .client
            .put(self.url(&format!("/notifications/{}/read", id)));
        self.send(request, &format!("mark notification {} as read", id))
            .await?;
        Ok(())
    }

    async fn mark_all_notifications_as_read(&self) -> Result<()> {
        let request = self.client.put(self.url("/notifications/read-all"));
        self.send(request, "mark all notifications as read").await?;
        Ok(())
    }

    async fn fetch_user_profile(&self) -> Result<UserProfile> {
        let request = self.client.get(self.url("/users/profile"));
        let response = self.send(request, "fetch user profile").await?;

        response
            .json()
            .await
            .context("Failed to parse user profile response")
    }

    async fn update_user_settings(&self, settings: &NotificationSettings) -> Result<()> {
        let request = self
            .client
            .put(self.url("/users/settings"))
            .json(&UpdateSettingsBody {
                notification_settings: settings,
            });
        self.send(request, "update user settings").await?;
        Ok(())
    }
}
