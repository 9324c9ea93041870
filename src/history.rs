//! Bounded summary history with oldest-first eviction.
//!
//! The store keeps at most `capacity` entries (default 3). Appending past
//! capacity evicts exactly one entry: the one with the earliest `created_at`,
//! ties broken by earliest insertion. The evicted entry is handed back so the
//! caller can react (e.g. flush it to disk before it is gone).
//!
//! Insert, capacity check, and eviction happen under a single `Mutex` guard,
//! so concurrent appends never observe each other half-applied and
//! [`list`](HistoryStore::list) never sees more than `capacity` entries.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::{ContextError, ContextResult};
use crate::models::SummaryEntry;

pub const DEFAULT_HISTORY_CAPACITY: usize = 3;

struct HistoryState {
    /// `(insertion sequence, entry)` in insertion order.
    entries: Vec<(u64, SummaryEntry)>,
    next_seq: u64,
}

impl HistoryState {
    fn push(&mut self, entry: SummaryEntry, capacity: usize) -> ContextResult<Option<SummaryEntry>> {
        self.entries.push((self.next_seq, entry));
        self.next_seq += 1;

        let mut evicted = None;
        if self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, (seq, e))| (e.created_at, *seq))
                .map(|(pos, _)| pos);
            if let Some(pos) = oldest {
                evicted = Some(self.entries.remove(pos).1);
            }
        }

        if self.entries.len() > capacity {
            return Err(ContextError::CapacityInvariantViolation {
                len: self.entries.len(),
                capacity,
            });
        }
        Ok(evicted)
    }
}

/// Process-lifetime store of generated summaries.
pub struct HistoryStore {
    capacity: usize,
    state: Mutex<HistoryState>,
}

impl HistoryStore {
    /// Empty store with [`DEFAULT_HISTORY_CAPACITY`].
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            state: Mutex::new(HistoryState {
                entries: Vec::new(),
                next_seq: 0,
            }),
        }
    }

    pub fn with_capacity(capacity: usize) -> ContextResult<Self> {
        if capacity < 1 {
            return Err(ContextError::invalid("history capacity must be >= 1"));
        }
        Ok(Self {
            capacity,
            ..Self::new()
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an entry, evicting the oldest if the store is over capacity.
    pub fn append(&self, entry: SummaryEntry) -> ContextResult<Option<SummaryEntry>> {
        let id = entry.id.clone();
        let evicted = self.lock().push(entry, self.capacity)?;
        match &evicted {
            Some(old) => info!(
                added = %id,
                evicted = %old.id,
                evicted_created_at = %old.created_at,
                "summary history full, evicted oldest entry"
            ),
            None => debug!(added = %id, "recorded summary"),
        }
        Ok(evicted)
    }

    /// Entries in insertion order, most recent last.
    pub fn list(&self) -> Vec<SummaryEntry> {
        self.lock().entries.iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<SummaryEntry> {
        self.lock()
            .entries
            .iter()
            .find(|(_, e)| e.id == id)
            .map(|(_, e)| e.clone())
    }

    /// The most recently appended entry.
    pub fn latest(&self) -> Option<SummaryEntry> {
        self.lock().entries.last().map(|(_, e)| e.clone())
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        debug!(dropped, "summary history cleared");
    }

    /// Replace the contents with previously persisted entries.
    ///
    /// Entries are appended in the given order under one lock, so the same
    /// eviction rule applies. Returns whatever was evicted along the way.
    pub fn restore(&self, entries: Vec<SummaryEntry>) -> ContextResult<Vec<SummaryEntry>> {
        let mut state = self.lock();
        state.entries.clear();
        let mut evicted = Vec::new();
        for entry in entries {
            if let Some(old) = state.push(entry, self.capacity)? {
                evicted.push(old);
            }
        }
        debug!(
            restored = state.entries.len(),
            evicted = evicted.len(),
            "summary history restored"
        );
        Ok(evicted)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn entry(name: &str, secs: i64) -> SummaryEntry {
        let mut e = SummaryEntry::new("model", name, 10).with_created_at(t(secs));
        e.id = name.to_string();
        e
    }

    fn ids(store: &HistoryStore) -> Vec<String> {
        store.list().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_fourth_append_evicts_first() {
        let store = HistoryStore::new();
        for (i, name) in ["1", "2", "3"].iter().enumerate() {
            assert!(store.append(entry(name, i as i64)).unwrap().is_none());
        }
        let evicted = store.append(entry("4", 3)).unwrap();
        assert_eq!(evicted.map(|e| e.id), Some("1".to_string()));
        assert_eq!(ids(&store), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_evicts_globally_oldest_not_newest_append() {
        let store = HistoryStore::new();
        store.append(entry("a", 10)).unwrap();
        store.append(entry("b", 20)).unwrap();
        store.append(entry("c", 30)).unwrap();
        // Older than b and c, newer than a.
        let evicted = store.append(entry("d", 15)).unwrap();
        assert_eq!(evicted.map(|e| e.id), Some("a".to_string()));
        assert_eq!(ids(&store), vec!["b", "c", "d"]);

        // Now the late entry is itself the oldest.
        let evicted = store.append(entry("e", 1)).unwrap();
        assert_eq!(evicted.map(|e| e.id), Some("e".to_string()));
        assert_eq!(ids(&store), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_ties_broken_by_insertion_order() {
        let store = HistoryStore::new();
        store.append(entry("x", 5)).unwrap();
        store.append(entry("y", 5)).unwrap();
        store.append(entry("z", 5)).unwrap();
        let evicted = store.append(entry("w", 5)).unwrap();
        assert_eq!(evicted.map(|e| e.id), Some("x".to_string()));
    }

    #[test]
    fn test_custom_capacity() {
        assert!(HistoryStore::with_capacity(0).is_err());
        let store = HistoryStore::with_capacity(1).unwrap();
        store.append(entry("a", 1)).unwrap();
        let evicted = store.append(entry("b", 2)).unwrap();
        assert_eq!(evicted.map(|e| e.id), Some("a".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_latest_clear() {
        let store = HistoryStore::new();
        assert!(store.latest().is_none());
        store.append(entry("a", 1)).unwrap();
        store.append(entry("b", 2)).unwrap();
        assert_eq!(store.get("a").map(|e| e.content), Some("a".to_string()));
        assert!(store.get("zzz").is_none());
        assert_eq!(store.latest().map(|e| e.id), Some("b".to_string()));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_restore_applies_bound() {
        let store = HistoryStore::new();
        store.append(entry("old", 0)).unwrap();
        let evicted = store
            .restore(vec![entry("1", 1), entry("2", 2), entry("3", 3), entry("4", 4)])
            .unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, "1");
        assert_eq!(ids(&store), vec!["2", "3", "4"]);
    }
}
