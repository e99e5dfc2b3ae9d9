//! In-memory notification store.
//!
//! Holds the session's authoritative list and publishes every change as a
//! versioned snapshot. Full fetches replace the list wholesale; read flags
//! are only changed through the reconciler entry points below, which also
//! keep the bookkeeping needed to roll optimistic changes back.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

use super::error::NotificationError;
use super::models::NotificationRecord;
use crate::remote::NotificationsApi;

/// Immutable view of the list at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSnapshot {
    /// Bumped on every change to the list.
    pub version: u64,
    pub records: Arc<Vec<NotificationRecord>>,
}

impl NotificationSnapshot {
    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome of starting an optimistic single mark-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkOneStart {
    Missing,
    AlreadyRead,
    Started,
}

#[derive(Default)]
struct ReadLedger {
    /// Ids with unconfirmed single mark-read calls, by number of calls in flight.
    pending_one: HashMap<String, usize>,
    /// Ids the server confirmed as read during this session.
    confirmed: HashSet<String>,
    /// Read flags to restore if the in-flight mark-all fails. `Some` while one
    /// is in flight.
    mark_all_prior: Option<HashMap<String, bool>>,
}

impl ReadLedger {
    /// Whether a local `read = true` for `id` must survive a refresh or rollback.
    fn keeps_read(&self, id: &str) -> bool {
        self.pending_one.contains_key(id)
            || self.confirmed.contains(id)
            || self.mark_all_prior.is_some()
    }
}

pub struct NotificationStore {
    api: Arc<dyn NotificationsApi>,
    snapshot_tx: watch::Sender<NotificationSnapshot>,
    ledger: Mutex<ReadLedger>,
    /// Number of the most recently issued fetch.
    fetch_seq: AtomicU64,
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationsApi>) -> Self {
        let (snapshot_tx, _) = watch::channel(NotificationSnapshot::default());
        Self {
            api,
            snapshot_tx,
            ledger: Mutex::new(ReadLedger::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    /// Replace the list with a fresh fetch from the remote API.
    ///
    /// On failure the prior list is kept untouched. A response that arrives
    /// after a newer `load` was issued is discarded with
    /// [`NotificationError::Superseded`].
    pub async fn load(&self) -> Result<Arc<Vec<NotificationRecord>>, NotificationError> {
        let request = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Fetching notifications (request {})", request);

        let mut records = self
            .api
            .fetch_notifications()
            .await
            .map_err(NotificationError::Fetch)?;

        let mut guard = self.ledger();
        let ledger = &mut *guard;
        let latest = self.fetch_seq.load(Ordering::SeqCst);
        if request != latest {
            debug!(
                "Discarding notifications response {} superseded by {}",
                request, latest
            );
            return Err(NotificationError::Superseded);
        }

        // Bookkeeping reads the server's flags, before any local overlay.
        let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        ledger.confirmed.retain(|id| ids.contains(id.as_str()));
        for record in records.iter().filter(|r| r.read) {
            // The server already applied a write whose response is still pending.
            if ledger.pending_one.contains_key(&record.id) {
                ledger.confirmed.insert(record.id.clone());
            }
        }
        if let Some(prior) = ledger.mark_all_prior.as_mut() {
            *prior = records
                .iter()
                .map(|r| (r.id.clone(), r.read))
                .collect();
            for id in ledger.pending_one.keys() {
                if let Some(flag) = prior.get_mut(id) {
                    *flag = false;
                }
            }
        }

        let mut kept_read = 0;
        for record in records.iter_mut() {
            if !record.read && ledger.keeps_read(&record.id) {
                record.read = true;
                kept_read += 1;
            }
        }

        let records = Arc::new(records);
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.records = Arc::clone(&records);
        });
        drop(guard);

        info!(
            "Loaded {} notifications ({} kept read locally)",
            records.len(),
            kept_read
        );
        Ok(records)
    }

    /// Current list in server order.
    pub fn get_all(&self) -> Arc<Vec<NotificationRecord>> {
        Arc::clone(&self.snapshot_tx.borrow().records)
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receive every future snapshot. The receiver starts at the current one.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn unread_count(&self) -> usize {
        self.snapshot_tx.borrow().unread_count()
    }

    pub(crate) fn api(&self) -> &Arc<dyn NotificationsApi> {
        &self.api
    }

    fn ledger(&self) -> MutexGuard<'_, ReadLedger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the read flags of the given ids, publishing a snapshot only when
    /// something changed.
    fn set_read(&self, ids: &HashSet<&str>, read: bool) -> usize {
        let mut changed = 0;
        self.snapshot_tx.send_if_modified(|snapshot| {
            let records = Arc::make_mut(&mut snapshot.records);
            for record in records.iter_mut() {
                if record.read != read && ids.contains(record.id.as_str()) {
                    record.read = read;
                    changed += 1;
                }
            }
            if changed > 0 {
                snapshot.version += 1;
            }
            changed > 0
        });
        changed
    }

    pub(crate) fn begin_mark_one(&self, id: &str) -> MarkOneStart {
        let mut ledger = self.ledger();
        match self.snapshot_tx.borrow().get(id) {
            None => return MarkOneStart::Missing,
            Some(record) if record.read => return MarkOneStart::AlreadyRead,
            Some(_) => {}
        }
        *ledger.pending_one.entry(id.to_string()).or_insert(0) += 1;
        self.set_read(&HashSet::from([id]), true);
        MarkOneStart::Started
    }

    /// Settle a single mark-read. Returns `true` when the record was rolled
    /// back to unread.
    pub(crate) fn finish_mark_one(&self, id: &str, confirmed: bool) -> bool {
        let mut ledger = self.ledger();
        if let Some(count) = ledger.pending_one.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                ledger.pending_one.remove(id);
            }
        }

        if confirmed {
            ledger.confirmed.insert(id.to_string());
            return false;
        }

        if let Some(prior) = ledger.mark_all_prior.as_mut() {
            if let Some(flag) = prior.get_mut(id) {
                *flag = false;
            }
        }
        if ledger.keeps_read(id) {
            return false;
        }
        self.set_read(&HashSet::from([id]), false) > 0
    }

    /// Mark every record read, remembering the previous flags. Returns `false`
    /// without touching anything if a mark-all is already in flight.
    pub(crate) fn begin_mark_all(&self) -> bool {
        let mut ledger = self.ledger();
        if ledger.mark_all_prior.is_some() {
            return false;
        }

        let snapshot = self.snapshot_tx.borrow().clone();
        let mut prior: HashMap<String, bool> = snapshot
            .records
            .iter()
            .map(|r| (r.id.clone(), r.read))
            .collect();
        // Reads still awaiting their own confirmation are not part of the
        // state to restore.
        for id in ledger.pending_one.keys() {
            if let Some(flag) = prior.get_mut(id) {
                *flag = false;
            }
        }
        ledger.mark_all_prior = Some(prior);

        let unread: HashSet<&str> = snapshot
            .records
            .iter()
            .filter(|r| !r.read)
            .map(|r| r.id.as_str())
            .collect();
        self.set_read(&unread, true);
        true
    }

    /// Settle the in-flight mark-all. Returns how many records were restored
    /// to unread.
    pub(crate) fn finish_mark_all(&self, confirmed: bool) -> usize {
        let mut ledger = self.ledger();
        let Some(prior) = ledger.mark_all_prior.take() else {
            return 0;
        };

        let snapshot = self.snapshot_tx.borrow().clone();
        if confirmed {
            ledger
                .confirmed
                .extend(snapshot.records.iter().map(|r| r.id.clone()));
            return 0;
        }

        let restore: HashSet<&str> = snapshot
            .records
            .iter()
            .filter(|r| prior.get(&r.id) == Some(&false))
            .filter(|r| !ledger.keeps_read(&r.id))
            .map(|r| r.id.as_str())
            .collect();
        self.set_read(&restore, false)
    }

    pub(crate) fn is_mark_all_in_flight(&self) -> bool {
        self.ledger().mark_all_prior.is_some()
    }
}
