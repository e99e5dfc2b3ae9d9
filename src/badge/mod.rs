//! Unread badge: display rules and the polling driver that keeps the count
//! fresh without loading the full list.

mod display;
mod driver;

pub use display::{format_badge, BADGE_OVERFLOW_LABEL, MAX_BADGE_COUNT};
pub use driver::{BadgeDriver, BadgeOptions, BadgePhase, BadgeState, DEFAULT_POLL_INTERVAL};

use async_trait::async_trait;

/// Anything that can report how many notifications are unread.
#[async_trait]
pub trait UnreadCountSource: Send + Sync {
    async fn unread_count(&self) -> anyhow::Result<u64>;
}
