//! One entry point over the notification core for a single screen or CLI
//! session.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::badge::{BadgeDriver, BadgeOptions};
use crate::notifications::{
    Confirmation, FilterCategory, FilterEngine, FilterSelection, NotificationError,
    NotificationRecord, NotificationService, NotificationStore, ReadStateReconciler,
};
use crate::periodic::{FirstTick, PeriodicTask};
use crate::remote::NotificationsApi;

pub struct NotificationCenter {
    store: Arc<NotificationStore>,
    filter: FilterEngine,
    reconciler: ReadStateReconciler,
    service: Arc<NotificationService>,
}

impl NotificationCenter {
    pub fn new(api: Arc<dyn NotificationsApi>) -> Self {
        let store = Arc::new(NotificationStore::new(Arc::clone(&api)));
        Self {
            reconciler: ReadStateReconciler::new(Arc::clone(&store)),
            filter: FilterEngine::new(FilterSelection::All),
            service: Arc::new(NotificationService::new(api)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    /// Reload the list. On failure the previous list stays and `false` is
    /// returned.
    pub async fn refresh(&self) -> bool {
        refresh_store(&self.store).await
    }

    /// The current list under the current filter selection.
    pub fn visible(&self) -> Arc<Vec<NotificationRecord>> {
        self.filter.view(&self.store.snapshot())
    }

    pub fn toggle_filter(&self, category: FilterCategory) -> FilterSelection {
        self.filter.toggle(category)
    }

    pub fn set_filter(&self, selection: FilterSelection) {
        self.filter.set_selection(selection);
    }

    pub fn mark_one_read(&self, id: &str) -> Option<Confirmation> {
        self.reconciler.mark_one_read(id)
    }

    pub fn mark_all_read(&self) -> Option<Confirmation> {
        self.reconciler.mark_all_read()
    }

    /// Unread count of the loaded list, regardless of the filter.
    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    /// Mount a badge that polls the server independently of the loaded list.
    pub fn mount_badge(&self, options: BadgeOptions) -> BadgeDriver {
        BadgeDriver::mount(self.service.clone(), options)
    }

    /// Reload the list every `interval`, starting one interval from now.
    /// The refresh stops when the returned task is dropped.
    pub fn start_auto_refresh(&self, interval: Duration) -> PeriodicTask {
        let store = Arc::clone(&self.store);
        info!("Starting list auto-refresh every {:?}", interval);
        PeriodicTask::spawn("list-refresh", interval, FirstTick::AfterPeriod, move || {
            let store = Arc::clone(&store);
            async move {
                refresh_store(&store).await;
            }
        })
    }
}

async fn refresh_store(store: &NotificationStore) -> bool {
    match store.load().await {
        Ok(records) => {
            debug!("Loaded {} notifications", records.len());
            true
        }
        Err(NotificationError::Superseded) => {
            debug!("Notification fetch superseded by a newer one");
            false
        }
        Err(e) => {
            warn!("Failed to refresh notifications, keeping last list: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationType;
    use crate::remote::{Endpoint, InMemoryNotificationsApi};

    fn center() -> (Arc<InMemoryNotificationsApi>, NotificationCenter) {
        let api = Arc::new(InMemoryNotificationsApi::with_demo_feed());
        let center = NotificationCenter::new(api.clone());
        (api, center)
    }

    #[tokio::test]
    async fn test_refresh_and_filter() {
        let (_api, center) = center();
        assert!(center.refresh().await);
        assert_eq!(center.visible().len(), 7);

        center.toggle_filter(FilterCategory::Only(NotificationType::Like));
        let visible = center.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].notification_type, NotificationType::Like);

        center.toggle_filter(FilterCategory::All);
        assert_eq!(center.visible().len(), 7);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_list() {
        let (api, center) = center();
        assert!(center.refresh().await);

        api.set_failing(Endpoint::FetchNotifications, true);
        assert!(!center.refresh().await);
        assert_eq!(center.store().get_all().len(), 7);
    }

    #[tokio::test]
    async fn test_mark_all_updates_visible_view() {
        let (_api, center) = center();
        center.refresh().await;
        assert_eq!(center.unread_count(), 5);

        center.mark_all_read().unwrap().confirmed().await.unwrap();

        assert_eq!(center.unread_count(), 0);
        assert!(center.visible().iter().all(|n| n.read));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_picks_up_new_records() {
        let (api, center) = center();
        center.refresh().await;

        let task = center.start_auto_refresh(Duration::from_secs(30));
        api.replace_notifications(vec![]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(center.store().get_all().len(), 7);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(center.store().get_all().is_empty());

        task.stop().await;
    }
}
