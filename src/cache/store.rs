//! Append-only entry store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use moka::sync::Cache;
use tracing::warn;

use crate::types::CacheKey;

/// In-memory mapping from [`CacheKey`] to resolved string.
///
/// Backed by an unbounded moka cache, so concurrent readers never block and
/// writers to different keys do not serialize on a global lock. Nothing is
/// ever evicted: the whole store is what gets persisted.
///
/// # Insert-only
///
/// Once a key maps to a value the mapping is fixed for the store's lifetime.
/// Re-inserting an existing key is ignored; if the new value differs, a
/// warning is logged and the original value is kept.
pub struct EntryStore {
    entries: Cache<CacheKey, Arc<str>>,
    dirty: AtomicBool,
}

impl EntryStore {
    /// Create an empty, clean store.
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
            dirty: AtomicBool::new(false),
        }
    }

    /// Create a clean store pre-populated from a loaded snapshot.
    pub fn from_entries(entries: impl IntoIterator<Item = (CacheKey, String)>) -> Self {
        let store = Self::new();
        for (key, value) in entries {
            store.entries.insert(key, Arc::from(value));
        }
        store
    }

    /// Look up a resolved string.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<str>> {
        self.entries.get(key)
    }

    /// Insert a resolved string and mark the store dirty.
    ///
    /// Returns the value now stored under `key`, which is the existing one if
    /// the key was already present.
    pub fn put(&self, key: CacheKey, value: impl Into<Arc<str>>) -> Arc<str> {
        let value = value.into();
        let entry = self.entries.entry(key).or_insert_with(|| Arc::clone(&value));
        if entry.is_fresh() {
            self.dirty.store(true, Ordering::Release);
        } else if *entry.value() != value {
            warn!(%key, "ignoring re-insertion of cached key with a different value");
        }
        entry.into_value()
    }

    /// Whether any entry was inserted since the store was created or last
    /// persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clear the dirty flag, returning its previous value.
    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Re-set the dirty flag after a failed persist.
    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all entries, ordered by key.
    pub fn entries(&self) -> BTreeMap<CacheKey, String> {
        self.entries
            .iter()
            .map(|(key, value)| (*key, value.to_string()))
            .collect()
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("len", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
