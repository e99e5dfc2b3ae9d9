//! Notification data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    News,
    Like,
    Comment,
    Mention,
    Stream,
    System,
    Profile,
}

impl NotificationType {
    pub const ALL: [NotificationType; 7] = [
        NotificationType::News,
        NotificationType::Like,
        NotificationType::Comment,
        NotificationType::Mention,
        NotificationType::Stream,
        NotificationType::System,
        NotificationType::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Mention => "mention",
            Self::Stream => "stream",
            Self::System => "system",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown notification type: {}", s))
    }
}

/// A notification as returned by the remote API.
///
/// `reference_id` and `reference_type` point at the subject entity and are
/// passed through untouched for navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl NotificationRecord {
    /// Whether this record is an actionable prompt (e.g. "follow") rather
    /// than a plain notification.
    pub fn is_actionable(&self) -> bool {
        self.action.is_some() || self.action_type.is_some()
    }

    pub fn route(&self) -> NotificationRoute {
        NotificationRoute {
            notification_type: Some(self.notification_type),
            reference_id: self.reference_id.clone(),
            reference_type: self.reference_type.clone(),
        }
    }
}

/// Where a tap on a notification should lead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRoute {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<NotificationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
}

impl NotificationRoute {
    /// Extract a route from an opaque payload. Unknown fields are ignored, an
    /// unknown `type` yields a route without a category.
    pub fn from_payload(data: &serde_json::Value) -> Self {
        let notification_type = data
            .get("type")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok());
        let reference_id = data.get("referenceId").filter(|v| !v.is_null()).cloned();
        let reference_type = data
            .get("referenceType")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self {
            notification_type,
            reference_id,
            reference_type,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notification_type.is_none() && self.reference_id.is_none()
    }
}
