//! Per-country dataset cache.
//!
//! Each country id owns a slot with its own lock. The map lock is only held long enough to find or
//! insert a slot, so loads of different countries run concurrently while two loads of the same
//! country are serialized and the second one sees the first one's result.

use crate::data::ObservationTable;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cached outcome of a load. `None` records that the country has no source file.
pub type CachedTable = Option<Arc<ObservationTable>>;

/// Lock over a single cache slot. `None` inside means nothing cached yet.
pub(crate) type SlotGuard<'a> = MutexGuard<'a, Option<CachedTable>>;

type Slot = Arc<Mutex<Option<CachedTable>>>;

#[derive(Default)]
pub struct DatasetCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, country: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(country.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Run `f` while holding the slot for `country`.
    ///
    /// `f` sees the cached entry (if any) and may fill it. Leaving it empty (e.g. after a failed
    /// load) means the next caller tries again.
    pub(crate) fn with_slot<R>(
        &self,
        country: &str,
        f: impl FnOnce(&mut SlotGuard<'_>) -> R,
    ) -> R {
        let slot = self.slot(country);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Cached entry for `country`, without loading.
    pub fn get(&self, country: &str) -> Option<CachedTable> {
        self.with_slot(country, |slot| (**slot).clone())
    }

    pub fn insert(&self, country: &str, table: CachedTable) {
        self.with_slot(country, |slot| **slot = Some(table));
    }

    /// Number of countries with a cached outcome.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        slots
            .iter()
            .filter(|s| s.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
