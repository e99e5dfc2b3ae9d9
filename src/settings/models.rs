//! Notification settings types and serialization.
//!
//! The settings record has a fixed schema: one flag per toggle. Single
//! toggles travel as [`NotificationSetting`] values, keyed the same way the
//! record's fields are named on the wire.

use serde::{Deserialize, Serialize};

use crate::notifications::NotificationType;

/// Per-user notification preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enable_push: bool,
    pub enable_news: bool,
    pub enable_like: bool,
    pub enable_comment: bool,
    pub enable_mention: bool,
    pub enable_stream: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enable_push: true,
            enable_news: true,
            enable_like: true,
            enable_comment: true,
            enable_mention: true,
            enable_stream: true,
        }
    }
}

impl NotificationSettings {
    pub fn apply(&mut self, setting: NotificationSetting) {
        match setting {
            NotificationSetting::PushEnabled(v) => self.enable_push = v,
            NotificationSetting::NewsEnabled(v) => self.enable_news = v,
            NotificationSetting::LikeEnabled(v) => self.enable_like = v,
            NotificationSetting::CommentEnabled(v) => self.enable_comment = v,
            NotificationSetting::MentionEnabled(v) => self.enable_mention = v,
            NotificationSetting::StreamEnabled(v) => self.enable_stream = v,
        }
    }

    /// Current value of the setting stored under `key`.
    pub fn get(&self, key: &str) -> Option<NotificationSetting> {
        let setting = match key {
            "enablePush" => NotificationSetting::PushEnabled(self.enable_push),
            "enableNews" => NotificationSetting::NewsEnabled(self.enable_news),
            "enableLike" => NotificationSetting::LikeEnabled(self.enable_like),
            "enableComment" => NotificationSetting::CommentEnabled(self.enable_comment),
            "enableMention" => NotificationSetting::MentionEnabled(self.enable_mention),
            "enableStream" => NotificationSetting::StreamEnabled(self.enable_stream),
            _ => return None,
        };
        Some(setting)
    }

    pub fn all(&self) -> Vec<NotificationSetting> {
        NotificationSetting::KEYS
            .iter()
            .filter_map(|key| self.get(key))
            .collect()
    }

    /// Whether notifications of this category should reach the user.
    ///
    /// Push must be on; `system` and `profile` have no toggle of their own.
    pub fn allows(&self, notification_type: NotificationType) -> bool {
        if !self.enable_push {
            return false;
        }
        match notification_type {
            NotificationType::News => self.enable_news,
            NotificationType::Like => self.enable_like,
            NotificationType::Comment => self.enable_comment,
            NotificationType::Mention => self.enable_mention,
            NotificationType::Stream => self.enable_stream,
            NotificationType::System | NotificationType::Profile => true,
        }
    }
}

/// A single notification toggle with its typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum NotificationSetting {
    #[serde(rename = "enablePush")]
    PushEnabled(bool),
    #[serde(rename = "enableNews")]
    NewsEnabled(bool),
    #[serde(rename = "enableLike")]
    LikeEnabled(bool),
    #[serde(rename = "enableComment")]
    CommentEnabled(bool),
    #[serde(rename = "enableMention")]
    MentionEnabled(bool),
    #[serde(rename = "enableStream")]
    StreamEnabled(bool),
}

impl NotificationSetting {
    pub const KEYS: [&'static str; 6] = [
        "enablePush",
        "enableNews",
        "enableLike",
        "enableComment",
        "enableMention",
        "enableStream",
    ];

    /// Get the key for this setting.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PushEnabled(_) => "enablePush",
            Self::NewsEnabled(_) => "enableNews",
            Self::LikeEnabled(_) => "enableLike",
            Self::CommentEnabled(_) => "enableComment",
            Self::MentionEnabled(_) => "enableMention",
            Self::StreamEnabled(_) => "enableStream",
        }
    }

    pub fn value(&self) -> bool {
        match *self {
            Self::PushEnabled(v)
            | Self::NewsEnabled(v)
            | Self::LikeEnabled(v)
            | Self::CommentEnabled(v)
            | Self::MentionEnabled(v)
            | Self::StreamEnabled(v) => v,
        }
    }

    /// Parse from key-value strings, e.g. a `key=value` CLI argument.
    ///
    /// Returns `Err` with a description if the key is unknown or the value is
    /// not a boolean.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, String> {
        let enabled = value
            .parse::<bool>()
            .map_err(|_| format!("Invalid boolean value for {}: {}", key, value));
        match key {
            "enablePush" => Ok(Self::PushEnabled(enabled?)),
            "enableNews" => Ok(Self::NewsEnabled(enabled?)),
            "enableLike" => Ok(Self::LikeEnabled(enabled?)),
            "enableComment" => Ok(Self::CommentEnabled(enabled?)),
            "enableMention" => Ok(Self::MentionEnabled(enabled?)),
            "enableStream" => Ok(Self::StreamEnabled(enabled?)),
            _ => Err(format!("Unknown setting key: {}", key)),
        }
    }

    pub fn is_known_key(key: &str) -> bool {
        Self::KEYS.iter().any(|k| *k == key)
    }
}

impl std::str::FromStr for NotificationSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected key=value, got: {}", s))?;
        Self::from_key_value(key.trim(), value.trim())
    }
}

/// The parts of the user profile the notification core reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: Option<String>,
    pub username: Option<String>,
    pub notification_settings: Option<NotificationSettings>,
}
