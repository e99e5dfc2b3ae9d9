//! Cancellable periodic tasks.
//!
//! A [`PeriodicTask`] is owned by whatever bounds its lifetime: dropping the
//! handle cancels the task, so a timer can never outlive its owner.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shortest accepted period. `tokio::time::interval` rejects zero.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// When the first tick fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediate,
    AfterPeriod,
}

pub struct PeriodicTask {
    name: String,
    cancellation_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn `tick` every `period` on the current tokio runtime.
    ///
    /// Ticks never overlap: a slow tick delays the following ones. A tick in
    /// progress is abandoned at its next suspension point when the task is
    /// cancelled. A period below [`MIN_PERIOD`] is raised to it.
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, first: FirstTick, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let period = if period < MIN_PERIOD {
            warn!(
                "Periodic task {} period {:?} is too short, using {:?}",
                name, period, MIN_PERIOD
            );
            MIN_PERIOD
        } else {
            period
        };
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let start = match first {
                FirstTick::Immediate => Instant::now(),
                FirstTick::AfterPeriod => Instant::now() + period,
            };
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tick() => {}
                }
            }
            debug!("Periodic task {} stopped", task_name);
        });

        debug!("Periodic task {} started with period {:?}", name, period);
        Self {
            name,
            cancellation_token,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Cancel and wait for the task to wind down.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
