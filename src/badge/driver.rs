use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::display::format_badge;
use super::UnreadCountSource;
use crate::periodic::{FirstTick, PeriodicTask};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgePhase {
    Idle,
    Polling,
}

/// What the badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadgeState {
    pub count: u64,
    /// Number of emphasis pulses fired so far. Bumped once per count change
    /// to a positive value, never for the initial count.
    pub pulses: u64,
}

impl BadgeState {
    pub fn label(&self) -> Option<String> {
        format_badge(self.count)
    }
}

#[derive(Debug, Clone)]
pub struct BadgeOptions {
    pub poll_interval: Duration,
    pub auto_update: bool,
    /// Count supplied by the owner; takes precedence over polling.
    pub external_count: Option<u64>,
}

impl Default for BadgeOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            auto_update: true,
            external_count: None,
        }
    }
}

/// Drives the unread badge.
///
/// Polls `source` while auto-update is on and no external count is supplied,
/// otherwise stays idle. Polling stops when the driver is dropped.
pub struct BadgeDriver {
    source: Arc<dyn UnreadCountSource>,
    poll_interval: Duration,
    auto_update: bool,
    external_count: Option<u64>,
    state_tx: Arc<watch::Sender<BadgeState>>,
    poller: Option<PeriodicTask>,
}

impl BadgeDriver {
    /// Mount the badge. Starts polling right away when the options call for it.
    /// Must be called within a tokio runtime.
    pub fn mount(source: Arc<dyn UnreadCountSource>, options: BadgeOptions) -> Self {
        let initial = BadgeState {
            count: options.external_count.unwrap_or(0),
            pulses: 0,
        };
        let (state_tx, _) = watch::channel(initial);

        let mut driver = Self {
            source,
            poll_interval: options.poll_interval,
            auto_update: options.auto_update,
            external_count: options.external_count,
            state_tx: Arc::new(state_tx),
            poller: None,
        };
        driver.sync_phase();
        driver
    }

    pub fn phase(&self) -> BadgePhase {
        if self.poller.is_some() {
            BadgePhase::Polling
        } else {
            BadgePhase::Idle
        }
    }

    pub fn state(&self) -> BadgeState {
        *self.state_tx.borrow()
    }

    pub fn count(&self) -> u64 {
        self.state().count
    }

    pub fn label(&self) -> Option<String> {
        self.state().label()
    }

    pub fn subscribe(&self) -> watch::Receiver<BadgeState> {
        self.state_tx.subscribe()
    }

    /// Supply or withdraw an external count.
    ///
    /// A supplied count stops polling. Withdrawing it restarts polling from an
    /// immediate fetch.
    pub fn set_external_count(&mut self, count: Option<u64>) {
        self.external_count = count;
        if let Some(count) = count {
            apply_count(&self.state_tx, count);
        }
        self.sync_phase();
    }

    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
        self.sync_phase();
    }

    /// Stop polling for good and wait for the timer to wind down.
    pub async fn teardown(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
        debug!("Badge torn down");
    }

    fn sync_phase(&mut self) {
        let should_poll = self.auto_update && self.external_count.is_none();
        match (should_poll, self.poller.is_some()) {
            (true, false) => {
                info!("Badge polling every {:?}", self.poll_interval);
                self.poller = Some(self.spawn_poller());
            }
            (false, true) => {
                debug!("Badge polling stopped");
                // Dropping the task cancels it.
                self.poller = None;
            }
            _ => {}
        }
    }

    fn spawn_poller(&self) -> PeriodicTask {
        let source = Arc::clone(&self.source);
        let state_tx = Arc::clone(&self.state_tx);
        PeriodicTask::spawn(
            "badge-unread-count",
            self.poll_interval,
            FirstTick::Immediate,
            move || {
                let source = Arc::clone(&source);
                let state_tx = Arc::clone(&state_tx);
                async move {
                    match source.unread_count().await {
                        Ok(count) => apply_count(&state_tx, count),
                        Err(e) => warn!("Failed to refresh badge count, keeping last value: {:#}", e),
                    }
                }
            },
        )
    }
}

fn apply_count(state_tx: &watch::Sender<BadgeState>, count: u64) {
    state_tx.send_if_modified(|state| {
        if state.count == count {
            return false;
        }
        state.count = count;
        if count > 0 {
            state.pulses += 1;
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeSource {
        count: AtomicU64,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UnreadCountSource for FakeSource {
        async fn unread_count(&self) -> anyhow::Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("offline");
            }
            Ok(self.count.load(Ordering::SeqCst))
        }
    }

    fn source_with(count: u64) -> Arc<FakeSource> {
        let source = FakeSource::default();
        source.count.store(count, Ordering::SeqCst);
        Arc::new(source)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_on_interval() {
        let source = source_with(3);
        let driver = BadgeDriver::mount(source.clone(), BadgeOptions::default());
        assert_eq!(driver.phase(), BadgePhase::Polling);

        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(driver.count(), 3);

        source.count.store(7, Ordering::SeqCst);
        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(driver.count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_keeps_count_and_polling() {
        let source = source_with(4);
        let driver = BadgeDriver::mount(source.clone(), BadgeOptions::default());
        settle().await;
        assert_eq!(driver.count(), 4);

        source.failing.store(true, Ordering::SeqCst);
        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(driver.count(), 4);
        assert_eq!(driver.phase(), BadgePhase::Polling);

        source.failing.store(false, Ordering::SeqCst);
        source.count.store(0, Ordering::SeqCst);
        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(driver.label(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_count_disables_polling() {
        let source = source_with(9);
        let mut driver = BadgeDriver::mount(
            source.clone(),
            BadgeOptions {
                external_count: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(driver.phase(), BadgePhase::Idle);
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(driver.count(), 2);

        driver.set_external_count(None);
        assert_eq!(driver.phase(), BadgePhase::Polling);
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(driver.count(), 9);

        driver.set_external_count(Some(1));
        assert_eq!(driver.phase(), BadgePhase::Idle);
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(driver.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_update_off_stays_idle() {
        let source = source_with(5);
        let mut driver = BadgeDriver::mount(
            source.clone(),
            BadgeOptions {
                auto_update: false,
                ..Default::default()
            },
        );
        settle().await;
        assert_eq!(driver.phase(), BadgePhase::Idle);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        driver.set_auto_update(true);
        settle().await;
        assert_eq!(driver.count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_polling() {
        let source = source_with(5);
        let driver = BadgeDriver::mount(source.clone(), BadgeOptions::default());
        settle().await;
        driver.teardown().await;

        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 5).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulse_fires_once_per_positive_change() {
        let source = source_with(0);
        let mut driver = BadgeDriver::mount(
            source,
            BadgeOptions {
                external_count: Some(3),
                ..Default::default()
            },
        );
        // No pulse for the count present at mount.
        assert_eq!(driver.state().pulses, 0);

        driver.set_external_count(Some(5));
        assert_eq!(driver.state(), BadgeState { count: 5, pulses: 1 });

        // Same count again is not a change.
        driver.set_external_count(Some(5));
        assert_eq!(driver.state().pulses, 1);

        driver.set_external_count(Some(0));
        assert_eq!(driver.state().pulses, 1);
        assert_eq!(driver.label(), None);

        driver.set_external_count(Some(150));
        assert_eq!(driver.state().pulses, 2);
        assert_eq!(driver.label().as_deref(), Some("99+"));
    }
}
