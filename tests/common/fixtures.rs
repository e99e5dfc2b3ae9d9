use newsfeed_notifications::{NotificationRecord, NotificationType};

pub fn record(id: &str, notification_type: NotificationType, read: bool) -> NotificationRecord {
    NotificationRecord {
        id: id.to_string(),
        notification_type,
        read,
        title: format!("Notification {}", id),
        message: Some(format!("Body of {}", id)),
        reference_id: Some(serde_json::json!(format!("ref-{}", id))),
        reference_type: Some(notification_type.to_string()),
        action: None,
        action_type: None,
        created_at: Some("2024-05-01T10:00:00Z".to_string()),
    }
}

/// Six records: two news, one each of like, comment, mention and profile.
/// `n2` and `n5` are read.
pub fn sample_records() -> Vec<NotificationRecord> {
    vec![
        record("n1", NotificationType::News, false),
        record("n2", NotificationType::Like, true),
        record("n3", NotificationType::Comment, false),
        record("n4", NotificationType::News, false),
        record("n5", NotificationType::Mention, true),
        NotificationRecord {
            action: Some("follow".to_string()),
            ..record("n6", NotificationType::Profile, false)
        },
    ]
}
