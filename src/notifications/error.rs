use thiserror::Error;

/// Errors surfaced by the notification core.
///
/// A denied permission is not an error: `schedule` reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Failed to fetch notifications: {0:#}")]
    Fetch(anyhow::Error),

    #[error("Fetch superseded by a newer request")]
    Superseded,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to schedule local notification: {0:#}")]
    Scheduling(anyhow::Error),

    #[error("Failed to confirm {operation}: {cause:#}")]
    Reconciliation {
        operation: &'static str,
        cause: anyhow::Error,
    },
}

impl NotificationError {
    pub(crate) fn reconciliation(operation: &'static str, cause: anyhow::Error) -> Self {
        Self::Reconciliation { operation, cause }
    }
}
