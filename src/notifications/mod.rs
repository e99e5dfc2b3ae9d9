//! Client-side notification state: the list, its filtered view and the
//! read-state reconciliation against the server.

mod error;
pub mod filter;
mod models;
mod reconciler;
mod service;
mod store;

pub use error::NotificationError;
pub use filter::{FilterCategory, FilterEngine, FilterSelection};
pub use models::{NotificationRecord, NotificationRoute, NotificationType};
pub use reconciler::{Confirmation, ReadStateReconciler};
pub use service::NotificationService;
pub use store::{NotificationSnapshot, NotificationStore};
