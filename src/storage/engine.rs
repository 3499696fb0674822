//! Thread-Safe LRU Storage Engine with Expiry Support
//!
//! This module implements the core storage engine for flashmc: a bounded
//! key-value store with least-recently-used eviction and per-entry TTL.
//!
//! ## Design Decisions
//!
//! 1. **HashMap + Recency List**: The map gives O(1) lookup, the arena-backed
//!    list gives O(1) recency updates and O(1) eviction from the front.
//! 2. **Single Lock**: The map and the list are guarded together by one
//!    `Mutex`. The list links are not safe to mutate concurrently, and every
//!    `get` is a write (it moves the entry to the back).
//! 3. **Lazy + Active Expiry**: `get` deletes expired entries it runs into;
//!    the background sweeper removes the rest.
//! 4. **Slot Reuse on Eviction**: When full, the front node is overwritten
//!    in place with the incoming key, so allocation stays bounded.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  Mutex<Inner>                                               │
//! │  ┌──────────────────────┐     ┌──────────────────────────┐  │
//! │  │ index: HashMap       │     │ recency: RecencyList     │  │
//! │  │   "a" ──> 3 ─────────┼───> │  [3] <-> [0] <-> [7]     │  │
//! │  │   "b" ──> 0          │     │  LRU              MRU    │  │
//! │  │   "c" ──> 7          │     │                          │  │
//! │  └──────────────────────┘     └──────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::storage::recency::RecencyList;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Capacity value meaning "no limit".
pub const UNBOUNDED: usize = usize::MAX;

/// Represents a stored value with its protocol metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The payload
    pub value: String,
    /// Opaque client flags, returned verbatim
    pub flags: u16,
    /// Payload length as declared by the client (not validated)
    pub byte_count: usize,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: impl Into<String>, flags: u16, byte_count: usize) -> Self {
        Self {
            value: value.into(),
            flags,
            byte_count,
            expires_at: None,
        }
    }

    /// Sets the entry to expire `ttl` from now.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(Instant::now() + ttl);
        self
    }

    /// Sets an absolute expiry instant (`None` = never).
    pub fn expiring_at(mut self, expires_at: Option<Instant>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    #[inline]
    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// Errors returned by store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A zero-length key was passed
    #[error("key must have a length greater than 0")]
    EmptyKey,

    /// The operation needs a live key that isn't there
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// `add` hit a live key
    #[error("key already exists: {0}")]
    KeyAlreadyExists(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Where `concat` places the new value relative to the stored one.
#[derive(Debug, Clone, Copy)]
enum Placement {
    After,
    Before,
}

/// Everything guarded by the engine lock.
#[derive(Debug, Default)]
struct Inner {
    index: HashMap<String, usize>,
    recency: RecencyList<Entry>,
}

impl Inner {
    /// Index of the node for `key` if it exists and has not expired.
    fn live_index(&self, key: &str) -> Option<usize> {
        let idx = *self.index.get(key)?;
        match self.recency.get(idx) {
            Some(node) if !node.value.is_expired() => Some(idx),
            _ => None,
        }
    }

    /// Inserts or overwrites `key`, evicting the LRU node when full.
    ///
    /// Returns the evicted key, if any.
    fn store(&mut self, key: &str, entry: Entry, capacity: usize) -> Option<String> {
        if let Some(&idx) = self.index.get(key) {
            if let Some(node) = self.recency.get_mut(idx) {
                node.value = entry;
            }
            self.recency.move_to_back(idx);
            return None;
        }

        if self.index.len() >= capacity {
            if let Some(idx) = self.recency.front() {
                if let Some(node) = self.recency.get_mut(idx) {
                    let evicted = std::mem::replace(&mut node.key, key.to_string());
                    node.value = entry;
                    self.index.remove(&evicted);
                    self.index.insert(key.to_string(), idx);
                    self.recency.move_to_back(idx);
                    return Some(evicted);
                }
            }
        }

        let idx = self.recency.push_back(key.to_string(), entry);
        self.index.insert(key.to_string(), idx);
        None
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(idx) => {
                self.recency.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Snapshot of the engine's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub expired: u64,
}

/// The storage engine for flashmc.
///
/// Designed to be wrapped in an `Arc` and shared by every connection task
/// and the expiry sweeper. All operations are serialized by one lock.
///
/// # Example
///
/// ```
/// use flashmc::storage::{Entry, StorageEngine};
///
/// let engine = StorageEngine::new(2);
///
/// engine.set("a", Entry::new("1", 0, 1)).unwrap();
/// engine.set("b", Entry::new("2", 0, 1)).unwrap();
/// engine.get("a").unwrap(); // "a" is now the most recently used
/// engine.set("c", Entry::new("3", 0, 1)).unwrap(); // evicts "b"
///
/// assert!(engine.get("b").is_err());
/// assert_eq!(engine.get("a").unwrap().value, "1");
/// ```
pub struct StorageEngine {
    inner: Mutex<Inner>,
    capacity: usize,

    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    evictions: AtomicU64,
    expired: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("keys", &self.len())
            .field("capacity", &self.capacity)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl StorageEngine {
    /// Creates an engine holding at most `capacity` keys.
    ///
    /// A capacity of `0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { UNBOUNDED } else { capacity };

        Self {
            inner: Mutex::new(Inner::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    /// Creates an engine without a capacity limit.
    pub fn unbounded() -> Self {
        Self::new(UNBOUNDED)
    }

    // No operation panics while holding the lock, so a poisoned lock still
    // guards a consistent map and list.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of keys held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores `entry` under `key`, overwriting any existing entry.
    ///
    /// When the engine is full and `key` is new, the least recently used
    /// entry is evicted first.
    pub fn set(&self, key: &str, entry: Entry) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut inner = self.lock();
        self.store_locked(&mut inner, key, entry);
        Ok(())
    }

    /// Returns a copy of the entry for `key` and marks it most recently used.
    ///
    /// An expired entry is deleted and reported as not found.
    pub fn get(&self, key: &str) -> StoreResult<Entry> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut inner = self.lock();

        let Some(&idx) = inner.index.get(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Err(StoreError::KeyNotFound(key.to_string()));
        };

        let live = inner
            .recency
            .get(idx)
            .filter(|node| !node.value.is_expired())
            .map(|node| node.value.clone());

        let Some(entry) = live else {
            inner.remove(key);
            self.expired.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Err(StoreError::KeyNotFound(key.to_string()));
        };

        inner.recency.move_to_back(idx);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(entry)
    }

    /// Deletes a key.
    ///
    /// Returns `true` if the key was removed, `false` if it didn't exist.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    /// Stores `entry` only if `key` is absent or expired.
    pub fn add(&self, key: &str, entry: Entry) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut inner = self.lock();
        if inner.live_index(key).is_some() {
            return Err(StoreError::KeyAlreadyExists(key.to_string()));
        }

        self.store_locked(&mut inner, key, entry);
        Ok(())
    }

    /// Stores `entry` only if `key` is present and not expired.
    pub fn replace(&self, key: &str, entry: Entry) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut inner = self.lock();
        if inner.live_index(key).is_none() {
            return Err(StoreError::KeyNotFound(key.to_string()));
        }

        self.store_locked(&mut inner, key, entry);
        Ok(())
    }

    /// Appends `entry.value` to the stored value.
    ///
    /// Byte counts are summed; the stored flags and expiry are kept.
    pub fn append(&self, key: &str, entry: Entry) -> StoreResult<()> {
        self.concat(key, entry, Placement::After)
    }

    /// Prepends `entry.value` to the stored value.
    ///
    /// Byte counts are summed; the stored flags and expiry are kept.
    pub fn prepend(&self, key: &str, entry: Entry) -> StoreResult<()> {
        self.concat(key, entry, Placement::Before)
    }

    fn concat(&self, key: &str, entry: Entry, placement: Placement) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut inner = self.lock();
        let idx = inner
            .live_index(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;

        if let Some(node) = inner.recency.get_mut(idx) {
            let stored = &mut node.value;
            match placement {
                Placement::After => stored.value.push_str(&entry.value),
                Placement::Before => stored.value.insert_str(0, &entry.value),
            }
            stored.byte_count += entry.byte_count;
        }

        inner.recency.move_to_back(idx);
        self.sets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Removes every expired entry.
    ///
    /// Walks the whole recency list: expiry order is unrelated to recency
    /// order, so there is no point at which the scan could stop early.
    ///
    /// # Returns
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let mut removed = 0;

        let mut cursor = inner.recency.front();
        while let Some(idx) = cursor {
            cursor = inner.recency.next(idx);

            let expired = inner
                .recency
                .get(idx)
                .map(|node| node.value.is_expired_at(now))
                .unwrap_or(false);

            if expired {
                if let Some((key, _)) = inner.recency.remove(idx) {
                    inner.index.remove(&key);
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            self.expired.fetch_add(removed as u64, Ordering::Relaxed);
        }

        removed
    }

    /// Keys ordered from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.lock();
        inner
            .recency
            .indices()
            .filter_map(|idx| inner.recency.get(idx).map(|node| node.key.clone()))
            .collect()
    }

    /// Returns a snapshot of the engine's counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }

    fn store_locked(&self, inner: &mut Inner, key: &str, entry: Entry) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        if inner.store(key, entry, self.capacity).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry(value: &str) -> Entry {
        Entry::new(value, 0, value.len())
    }

    fn expired(value: &str) -> Entry {
        entry(value).with_ttl(Duration::ZERO)
    }

    /// Checks that the map and the list describe the same set of keys.
    fn assert_consistent(engine: &StorageEngine) {
        let inner = engine.lock();
        assert_eq!(inner.index.len(), inner.recency.len());
        assert_eq!(inner.recency.indices().count(), inner.recency.len());
        for (key, &idx) in &inner.index {
            assert_eq!(&inner.recency.get(idx).unwrap().key, key);
        }
    }

    #[test]
    fn test_get_empty_engine() {
        let engine = StorageEngine::unbounded();
        assert_eq!(
            engine.get("key"),
            Err(StoreError::KeyNotFound("key".to_string()))
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let engine = StorageEngine::unbounded();

        assert_eq!(engine.get(""), Err(StoreError::EmptyKey));
        assert_eq!(engine.set("", entry("v")), Err(StoreError::EmptyKey));
        assert_eq!(engine.add("", entry("v")), Err(StoreError::EmptyKey));
        assert_eq!(engine.replace("", entry("v")), Err(StoreError::EmptyKey));
        assert_eq!(engine.append("", entry("v")), Err(StoreError::EmptyKey));
        assert_eq!(engine.prepend("", entry("v")), Err(StoreError::EmptyKey));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::unbounded();

        engine.set("key", Entry::new("value", 42, 5)).unwrap();
        assert_eq!(engine.len(), 1);

        let got = engine.get("key").unwrap();
        assert_eq!(got.value, "value");
        assert_eq!(got.flags, 42);
        assert_eq!(got.byte_count, 5);
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let engine = StorageEngine::unbounded();

        engine.set("key", entry("one")).unwrap();
        engine.set("key", entry("two")).unwrap();

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get("key").unwrap().value, "two");
        assert_consistent(&engine);
    }

    #[test]
    fn test_delete() {
        let engine = StorageEngine::unbounded();

        engine.set("key", entry("value")).unwrap();
        assert!(engine.delete("key"));
        assert!(engine.get("key").is_err());
        assert!(!engine.delete("key")); // Already deleted
        assert!(!engine.delete("never-set"));
        assert_eq!(engine.len(), 0);
        assert_consistent(&engine);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(StorageEngine::new(10).capacity(), 10);
        assert_eq!(StorageEngine::new(0).capacity(), UNBOUNDED);
        assert_eq!(StorageEngine::default().capacity(), UNBOUNDED);
    }

    #[test]
    fn test_unbounded_capacity() {
        let engine = StorageEngine::new(0);
        for i in 0..1000 {
            engine.set(&format!("key{}", i), entry("v")).unwrap();
        }
        assert_eq!(engine.len(), 1000);
        assert_eq!(engine.stats().evictions, 0);
    }

    #[test]
    fn test_eviction_removes_least_recently_set() {
        let engine = StorageEngine::new(3);

        engine.set("a", entry("1")).unwrap();
        engine.set("b", entry("2")).unwrap();
        engine.set("c", entry("3")).unwrap();
        engine.set("d", entry("4")).unwrap();

        assert_eq!(engine.len(), 3);
        assert!(engine.get("a").is_err());
        assert_eq!(engine.keys(), vec!["b", "c", "d"]);
        assert_eq!(engine.stats().evictions, 1);
        assert_consistent(&engine);
    }

    #[test]
    fn test_eviction_respects_get_recency() {
        let engine = StorageEngine::new(3);

        engine.set("a", entry("1")).unwrap();
        engine.set("b", entry("2")).unwrap();
        engine.set("c", entry("3")).unwrap();

        // Touch "a", so "b" becomes the LRU key
        engine.get("a").unwrap();
        engine.set("d", entry("4")).unwrap();

        assert!(engine.get("b").is_err());
        assert_eq!(engine.get("a").unwrap().value, "1");
        assert_eq!(engine.get("c").unwrap().value, "3");
        assert_eq!(engine.get("d").unwrap().value, "4");
    }

    #[test]
    fn test_eviction_respects_overwrite_recency() {
        let engine = StorageEngine::new(2);

        engine.set("a", entry("1")).unwrap();
        engine.set("b", entry("2")).unwrap();
        engine.set("a", entry("1b")).unwrap();
        engine.set("c", entry("3")).unwrap();

        assert_eq!(engine.keys(), vec!["a", "c"]);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let engine = StorageEngine::new(5);

        for i in 0..100 {
            let key = format!("key{}", i);
            engine.set(&key, entry("v")).unwrap();
            assert!(engine.len() <= 5);

            // The key just written is always retrievable
            assert!(engine.get(&key).is_ok());
        }

        // The survivors are the five most recent writes
        assert_eq!(
            engine.keys(),
            vec!["key95", "key96", "key97", "key98", "key99"]
        );
        assert_consistent(&engine);
    }

    #[test]
    fn test_add() {
        let engine = StorageEngine::unbounded();

        engine.add("key", entry("value")).unwrap();
        assert_eq!(engine.get("key").unwrap().value, "value");
    }

    #[test]
    fn test_add_key_already_exists() {
        let engine = StorageEngine::unbounded();

        engine.set("key", entry("original")).unwrap();
        assert_eq!(
            engine.add("key", entry("new")),
            Err(StoreError::KeyAlreadyExists("key".to_string()))
        );
        assert_eq!(engine.get("key").unwrap().value, "original");
    }

    #[test]
    fn test_add_over_expired_key() {
        let engine = StorageEngine::unbounded();

        engine.set("key", expired("stale")).unwrap();
        engine.add("key", entry("fresh")).unwrap();

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get("key").unwrap().value, "fresh");
    }

    #[test]
    fn test_replace() {
        let engine = StorageEngine::unbounded();

        engine.set("key", entry("original")).unwrap();
        engine.replace("key", Entry::new("new", 7, 3)).unwrap();

        let got = engine.get("key").unwrap();
        assert_eq!(got.value, "new");
        assert_eq!(got.flags, 7);
    }

    #[test]
    fn test_replace_key_doesnt_exist() {
        let engine = StorageEngine::unbounded();

        assert_eq!(
            engine.replace("key", entry("new")),
            Err(StoreError::KeyNotFound("key".to_string()))
        );
        assert!(engine.is_empty());
    }

    #[test]
    fn test_replace_expired_key_is_not_found() {
        let engine = StorageEngine::unbounded();

        engine.set("key", expired("stale")).unwrap();
        assert!(matches!(
            engine.replace("key", entry("new")),
            Err(StoreError::KeyNotFound(_))
        ));

        // No mutation: the stale entry is still held until read or swept
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_append() {
        let engine = StorageEngine::unbounded();

        engine.set("key", Entry::new("hello", 3, 5)).unwrap();
        engine.append("key", Entry::new(" world", 9, 6)).unwrap();

        let got = engine.get("key").unwrap();
        assert_eq!(got.value, "hello world");
        assert_eq!(got.byte_count, 11);
        assert_eq!(got.flags, 3);
        assert_eq!(got.expires_at, None);
    }

    #[test]
    fn test_append_keeps_stored_expiry() {
        let engine = StorageEngine::unbounded();

        let stored = Entry::new("a", 0, 1).with_ttl(Duration::from_secs(3600));
        let expires_at = stored.expires_at;
        engine.set("key", stored).unwrap();

        engine
            .append("key", Entry::new("b", 0, 1).with_ttl(Duration::from_secs(1)))
            .unwrap();

        assert_eq!(engine.get("key").unwrap().expires_at, expires_at);
    }

    #[test]
    fn test_append_key_doesnt_exist() {
        let engine = StorageEngine::unbounded();

        assert_eq!(
            engine.append("key", entry("v")),
            Err(StoreError::KeyNotFound("key".to_string()))
        );
    }

    #[test]
    fn test_prepend() {
        let engine = StorageEngine::unbounded();

        engine.set("key", Entry::new("world", 4, 5)).unwrap();
        engine.prepend("key", Entry::new("hello ", 1, 6)).unwrap();

        let got = engine.get("key").unwrap();
        assert_eq!(got.value, "hello world");
        assert_eq!(got.byte_count, 11);
        assert_eq!(got.flags, 4);
    }

    #[test]
    fn test_prepend_key_doesnt_exist() {
        let engine = StorageEngine::unbounded();

        assert!(matches!(
            engine.prepend("key", entry("v")),
            Err(StoreError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_append_marks_most_recently_used() {
        let engine = StorageEngine::new(2);

        engine.set("a", entry("1")).unwrap();
        engine.set("b", entry("2")).unwrap();
        engine.append("a", entry("x")).unwrap();
        engine.set("c", entry("3")).unwrap();

        assert_eq!(engine.keys(), vec!["a", "c"]);
    }

    #[test]
    fn test_expired_get_deletes_entry() {
        let engine = StorageEngine::unbounded();

        engine.set("live", entry("v")).unwrap();
        engine.set("key", expired("v")).unwrap();
        assert_eq!(engine.len(), 2);

        assert_eq!(
            engine.get("key"),
            Err(StoreError::KeyNotFound("key".to_string()))
        );
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.stats().expired, 1);
        assert_consistent(&engine);
    }

    #[test]
    fn test_expiry_after_ttl() {
        let engine = StorageEngine::unbounded();

        engine
            .set("key", entry("v").with_ttl(Duration::from_millis(50)))
            .unwrap();
        assert!(engine.get("key").is_ok());

        std::thread::sleep(Duration::from_millis(100));

        assert!(engine.get("key").is_err());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_expired_key_rejected_by_append_and_prepend() {
        let engine = StorageEngine::unbounded();

        engine.set("key", expired("v")).unwrap();
        assert!(matches!(
            engine.append("key", entry("x")),
            Err(StoreError::KeyNotFound(_))
        ));
        assert!(matches!(
            engine.prepend("key", entry("x")),
            Err(StoreError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_delete_expired_key() {
        let engine = StorageEngine::unbounded();

        engine.set("key", expired("v")).unwrap();
        assert!(engine.delete("key"));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_never_expires_without_ttl() {
        let entry = entry("v");
        assert_eq!(entry.expires_at, None);
        assert!(!entry.is_expired());
        assert!(!entry.clone().expiring_at(None).is_expired());
    }

    #[test]
    fn test_remove_expired() {
        let engine = StorageEngine::unbounded();

        // Interleave expired and live entries so the scan can't stop early
        for i in 0..10 {
            let key = format!("key{}", i);
            if i % 2 == 0 {
                engine.set(&key, expired("v")).unwrap();
            } else {
                engine.set(&key, entry("v")).unwrap();
            }
        }

        assert_eq!(engine.remove_expired(), 5);
        assert_eq!(engine.len(), 5);
        assert_eq!(
            engine.keys(),
            vec!["key1", "key3", "key5", "key7", "key9"]
        );
        assert_eq!(engine.remove_expired(), 0);
        assert_consistent(&engine);
    }

    #[test]
    fn test_remove_expired_everything() {
        let engine = StorageEngine::unbounded();
        for i in 0..1000 {
            engine.set(&format!("key{}", i), expired("v")).unwrap();
        }

        assert_eq!(engine.remove_expired(), 1000);
        assert!(engine.is_empty());
        assert_consistent(&engine);
    }

    #[test]
    fn test_stats() {
        let engine = StorageEngine::new(1);

        engine.set("a", entry("1")).unwrap();
        engine.set("b", entry("2")).unwrap();
        let _ = engine.get("a");
        let _ = engine.get("b");

        let stats = engine.stats();
        assert_eq!(stats.keys, 1);
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.sets, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_concurrent_disjoint_keys() {
        let engine = Arc::new(StorageEngine::unbounded());

        std::thread::scope(|scope| {
            for t in 0..8 {
                let engine = Arc::clone(&engine);
                scope.spawn(move || {
                    for i in 0..500 {
                        let key = format!("t{}:key{}", t, i);
                        engine.set(&key, entry("v")).unwrap();
                        assert_eq!(engine.get(&key).unwrap().value, "v");
                    }
                });
            }
        });

        assert_eq!(engine.len(), 8 * 500);
        assert_consistent(&engine);
    }

    #[test]
    fn test_concurrent_eviction_with_sweep() {
        let engine = Arc::new(StorageEngine::new(64));

        std::thread::scope(|scope| {
            for t in 0..4 {
                let engine = Arc::clone(&engine);
                scope.spawn(move || {
                    for i in 0..1000 {
                        let key = format!("t{}:key{}", t, i);
                        let value = if i % 3 == 0 { expired("v") } else { entry("v") };
                        engine.set(&key, value).unwrap();
                        let _ = engine.get(&key);
                    }
                });
            }

            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                for _ in 0..200 {
                    engine.remove_expired();
                }
            });
        });

        assert!(engine.len() <= 64);
        assert_consistent(&engine);
    }
}
