//! Representative notifications per category, for the "send a test
//! notification" flow.

use serde_json::json;

use crate::notifications::NotificationType;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleNotification {
    pub title: &'static str,
    pub body: &'static str,
    pub data: serde_json::Value,
}

pub fn sample_notification(notification_type: NotificationType) -> SampleNotification {
    let (title, body, reference_type, reference_id) = match notification_type {
        NotificationType::News => ("Breaking news", "A new story was just published", "news", 1),
        NotificationType::Like => ("New like", "Someone liked your comment", "comment", 2),
        NotificationType::Comment => ("New comment", "Someone replied to your post", "news", 3),
        NotificationType::Mention => ("You were mentioned", "Someone mentioned you in a comment", "comment", 4),
        NotificationType::Stream => ("Live now", "A stream you follow has started", "stream", 5),
        NotificationType::System => ("System update", "New features are available", "system", 6),
        NotificationType::Profile => ("New follower", "Someone started following you", "profile", 7),
    };

    SampleNotification {
        title,
        body,
        data: json!({
            "type": notification_type.as_str(),
            "referenceId": reference_id,
            "referenceType": reference_type,
        }),
    }
}
