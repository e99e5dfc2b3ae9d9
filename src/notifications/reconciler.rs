//! Optimistic read-state mutations and their reconciliation with the server.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::NotificationError;
use super::store::{MarkOneStart, NotificationStore};

/// Pending server confirmation of an optimistic change.
///
/// The local state is already updated when this is returned. Awaiting it
/// yields the confirmation outcome; dropping it lets the confirmation run
/// detached (failures are still logged and rolled back).
#[must_use = "dropping the confirmation discards the failure signal"]
pub struct Confirmation {
    handle: JoinHandle<Result<(), NotificationError>>,
}

impl Confirmation {
    /// Wait for the server outcome. An `Err` here means the optimistic change
    /// has been rolled back.
    pub async fn confirmed(self) -> Result<(), NotificationError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(NotificationError::reconciliation(
                "read state",
                anyhow::anyhow!("Confirmation task failed: {}", e),
            )),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// The only writer of read flags in the [`NotificationStore`].
///
/// Both operations apply their change locally, return immediately, and
/// confirm in a spawned task. A failed confirmation rolls the change back.
pub struct ReadStateReconciler {
    store: Arc<NotificationStore>,
}

impl ReadStateReconciler {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Mark one notification read.
    ///
    /// Returns `None` when there is nothing to confirm: the id is not in the
    /// list (a refresh may have raced the tap) or the record is already read.
    /// Must be called within a tokio runtime.
    pub fn mark_one_read(&self, id: &str) -> Option<Confirmation> {
        match self.store.begin_mark_one(id) {
            MarkOneStart::Missing => {
                debug!("Ignoring mark-read for unknown notification {}", id);
                return None;
            }
            MarkOneStart::AlreadyRead => {
                debug!("Notification {} is already read", id);
                return None;
            }
            MarkOneStart::Started => {}
        }

        let store = Arc::clone(&self.store);
        let id = id.to_string();
        let handle = tokio::spawn(async move {
            let result = store.api().mark_notification_as_read(&id).await;
            match result {
                Ok(()) => {
                    store.finish_mark_one(&id, true);
                    debug!("Notification {} confirmed read", id);
                    Ok(())
                }
                Err(e) => {
                    let rolled_back = store.finish_mark_one(&id, false);
                    warn!(
                        "Failed to mark notification {} as read (rolled back: {}): {:#}",
                        id, rolled_back, e
                    );
                    Err(NotificationError::reconciliation("mark notification read", e))
                }
            }
        });
        Some(Confirmation { handle })
    }

    /// Mark every notification read.
    ///
    /// Returns `None` without touching the store or calling the API when a
    /// previous mark-all is still in flight. Must be called within a tokio
    /// runtime.
    pub fn mark_all_read(&self) -> Option<Confirmation> {
        if !self.store.begin_mark_all() {
            debug!("Mark-all already in flight, ignoring");
            return None;
        }

        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            let result = store.api().mark_all_notifications_as_read().await;
            match result {
                Ok(()) => {
                    store.finish_mark_all(true);
                    info!("All notifications confirmed read");
                    Ok(())
                }
                Err(e) => {
                    let restored = store.finish_mark_all(false);
                    error!(
                        "Failed to mark all notifications as read, restored {} unread: {:#}",
                        restored, e
                    );
                    Err(NotificationError::reconciliation(
                        "mark all notifications read",
                        e,
                    ))
                }
            }
        });
        Some(Confirmation { handle })
    }

    pub fn is_mark_all_in_flight(&self) -> bool {
        self.store.is_mark_all_in_flight()
    }
}
