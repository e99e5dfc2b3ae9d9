//! Category filtering of the notification list.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::models::{NotificationRecord, NotificationType};
use super::store::NotificationSnapshot;

/// A selectable filter chip: either the `all` sentinel or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    All,
    Only(NotificationType),
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(t) => write!(f, "{}", t),
        }
    }
}

impl FromStr for FilterCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

/// Selected filter categories.
///
/// Never empty: `All` is the sentinel for "no filtering" and is mutually
/// exclusive with specific categories.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterSelection {
    #[default]
    All,
    Categories(BTreeSet<NotificationType>),
}

impl FilterSelection {
    /// Build a selection from specific categories; an empty input means `All`.
    pub fn of(types: impl IntoIterator<Item = NotificationType>) -> Self {
        let set: BTreeSet<_> = types.into_iter().collect();
        if set.is_empty() {
            Self::All
        } else {
            Self::Categories(set)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn contains(&self, category: FilterCategory) -> bool {
        match (self, category) {
            (Self::All, FilterCategory::All) => true,
            (Self::All, FilterCategory::Only(_)) => false,
            (Self::Categories(_), FilterCategory::All) => false,
            (Self::Categories(set), FilterCategory::Only(t)) => set.contains(&t),
        }
    }

    /// Whether a record of this type passes the filter.
    pub fn admits(&self, notification_type: NotificationType) -> bool {
        match self {
            Self::All => true,
            Self::Categories(set) => set.contains(&notification_type),
        }
    }

    /// Tap on a filter chip.
    ///
    /// Selecting `all` clears every category. Selecting a category clears
    /// `all`; tapping a selected category deselects it, and deselecting the
    /// last one falls back to `all`.
    pub fn toggle(&mut self, category: FilterCategory) {
        let next = match (std::mem::take(self), category) {
            (_, FilterCategory::All) => Self::All,
            (Self::All, FilterCategory::Only(t)) => Self::of([t]),
            (Self::Categories(mut set), FilterCategory::Only(t)) => {
                if !set.remove(&t) {
                    set.insert(t);
                }
                Self::of(set)
            }
        };
        *self = next;
    }

    pub fn categories(&self) -> Vec<FilterCategory> {
        match self {
            Self::All => vec![FilterCategory::All],
            Self::Categories(set) => set.iter().copied().map(FilterCategory::Only).collect(),
        }
    }
}

impl FromStr for FilterSelection {
    type Err = String;

    /// Parse a comma-separated list such as `news,like` or `all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selection = Self::All;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let category = part.parse::<FilterCategory>()?;
            if !selection.contains(category) {
                selection.toggle(category);
            }
        }
        Ok(selection)
    }
}

impl Serialize for FilterSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<String> = self.categories().iter().map(|c| c.to_string()).collect();
        names.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names.join(",").parse().map_err(serde::de::Error::custom)
    }
}

/// Subsequence of `records` admitted by `selection`, in original order.
pub fn apply(records: &[NotificationRecord], selection: &FilterSelection) -> Vec<NotificationRecord> {
    match selection {
        FilterSelection::All => records.to_vec(),
        FilterSelection::Categories(_) => records
            .iter()
            .filter(|r| selection.admits(r.notification_type))
            .cloned()
            .collect(),
    }
}

struct CachedView {
    version: u64,
    selection: FilterSelection,
    records: Arc<Vec<NotificationRecord>>,
}

/// Holds the current selection and memoizes the filtered view per
/// (snapshot version, selection).
#[derive(Default)]
pub struct FilterEngine {
    selection: Mutex<FilterSelection>,
    cache: Mutex<Option<CachedView>>,
}

impl FilterEngine {
    pub fn new(selection: FilterSelection) -> Self {
        Self {
            selection: Mutex::new(selection),
            cache: Mutex::new(None),
        }
    }

    pub fn selection(&self) -> FilterSelection {
        lock(&self.selection).clone()
    }

    pub fn set_selection(&self, selection: FilterSelection) {
        *lock(&self.selection) = selection;
    }

    pub fn toggle(&self, category: FilterCategory) -> FilterSelection {
        let mut selection = lock(&self.selection);
        selection.toggle(category);
        selection.clone()
    }

    /// Filtered view of `snapshot` under the current selection.
    pub fn view(&self, snapshot: &NotificationSnapshot) -> Arc<Vec<NotificationRecord>> {
        let selection = self.selection();
        let mut cache = lock(&self.cache);
        if let Some(cached) = cache.as_ref() {
            if cached.version == snapshot.version && cached.selection == selection {
                return Arc::clone(&cached.records);
            }
        }

        let records = if selection.is_all() {
            Arc::clone(&snapshot.records)
        } else {
            Arc::new(apply(&snapshot.records, &selection))
        };
        *cache = Some(CachedView {
            version: snapshot.version,
            selection,
            records: Arc::clone(&records),
        });
        records
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
