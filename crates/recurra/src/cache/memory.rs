//! In-memory instance store with LRU eviction.
//!
//! Entries live in an `LruCache` bounded by `max_entries`, each with its own
//! expiry. A `template id -> keys` index makes invalidation proportional to
//! the number of entries of that template.
//!
//! Every invalidation bumps an epoch. A read takes a [`FillTicket`] stamped
//! with the current epoch before it loads anything, and `fill` refuses
//! tickets from before the latest invalidation. Together with taking the same
//! lock for lookups, fills and evictions, this keeps invalidation
//! linearizable: once `evict_template` returns, no later lookup sees an
//! older value.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use lru::LruCache;
use uuid::Uuid;

use recurra_core::cache::{CacheError, FillTicket, InstanceKey, InstanceStore, Lookup, Result};
use recurra_core::calendar::Occurrence;

/// A cached expansion and its expiry.
#[derive(Debug, Clone)]
struct CacheEntry {
    occurrences: Arc<Vec<Occurrence>>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(occurrences: Arc<Vec<Occurrence>>, ttl: Duration) -> Self {
        Self {
            occurrences,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<InstanceKey, CacheEntry>,
    /// Maps template_id -> keys currently cached for it.
    index: HashMap<Uuid, HashSet<InstanceKey>>,
    epoch: u64,
}

impl Inner {
    fn unindex(&mut self, key: &InstanceKey) {
        if let Some(keys) = self.index.get_mut(&key.template_id) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&key.template_id);
            }
        }
    }
}

/// Thread-safe in-memory [`InstanceStore`].
///
/// Lookups take a shared lock and never block each other. Expired entries are
/// ignored on lookup and dropped lazily when they are overwritten or evicted.
/// Lookups do not refresh recency, so eviction order follows insertion order.
#[derive(Debug, Clone)]
pub struct MemoryInstanceStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryInstanceStore {
    /// Creates a new store holding at most `max_entries` expansions.
    pub fn new(max_entries: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                entries: LruCache::new(max_entries),
                index: HashMap::new(),
                epoch: 0,
            })),
        }
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of templates with at least one stored entry.
    pub fn template_count(&self) -> usize {
        self.read().map(|inner| inner.index.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| CacheError::Unavailable("instance store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| CacheError::Unavailable("instance store lock poisoned".to_string()))
    }
}

impl InstanceStore for MemoryInstanceStore {
    fn ticket(&self) -> Result<FillTicket> {
        Ok(FillTicket::new(self.read()?.epoch))
    }

    fn lookup(&self, key: &InstanceKey) -> Result<Lookup> {
        let inner = self.read()?;
        match inner.entries.peek(key) {
            Some(entry) if !entry.is_expired() => {
                Ok(Lookup::Hit(Arc::clone(&entry.occurrences)))
            }
            _ => Ok(Lookup::Miss),
        }
    }

    fn fill(
        &self,
        key: InstanceKey,
        occurrences: Arc<Vec<Occurrence>>,
        ttl: Duration,
        ticket: FillTicket,
    ) -> Result<bool> {
        let mut inner = self.write()?;
        if ticket.epoch() != inner.epoch {
            return Ok(false);
        }

        let entry = CacheEntry::new(occurrences, ttl);
        if let Some((evicted, _)) = inner.entries.push(key, entry) {
            if evicted != key {
                inner.unindex(&evicted);
            }
        }
        inner.index.entry(key.template_id).or_default().insert(key);
        Ok(true)
    }

    fn evict_template(&self, template_id: Uuid) -> Result<usize> {
        let mut inner = self.write()?;
        inner.epoch = inner.epoch.wrapping_add(1);

        let keys = inner.index.remove(&template_id).unwrap_or_default();
        for key in &keys {
            inner.entries.pop(key);
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use recurra_core::calendar::{EventRecord, EventTemplate};
    use recurra_core::storage::TimeWindow;
    use std::thread;

    /// Default max entries for tests
    const TEST_MAX_ENTRIES: usize = 1000;

    const TTL: Duration = Duration::from_secs(60);

    fn store(max_entries: usize) -> MemoryInstanceStore {
        MemoryInstanceStore::new(NonZeroUsize::new(max_entries).unwrap())
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn key(template_id: Uuid, from: u32, to: u32) -> InstanceKey {
        InstanceKey::new(template_id, &TimeWindow::new(day(from), day(to)).unwrap())
    }

    fn occurrences(template_id: Uuid, count: u64) -> Arc<Vec<Occurrence>> {
        let record =
            EventRecord::new(Uuid::nil(), "Standup", day(1), day(1)).with_id(template_id);
        let template = EventTemplate::from_record(&record, None);
        Arc::new((0..count).map(|n| template.occurrence(n, day(1))).collect())
    }

    fn miss_ticket(store: &MemoryInstanceStore, key: &InstanceKey) -> FillTicket {
        let ticket = store.ticket().unwrap();
        assert!(
            matches!(store.lookup(key).unwrap(), Lookup::Miss),
            "expected a miss for {key}"
        );
        ticket
    }

    fn hit(store: &MemoryInstanceStore, key: &InstanceKey) -> Option<Arc<Vec<Occurrence>>> {
        match store.lookup(key).unwrap() {
            Lookup::Hit(occurrences) => Some(occurrences),
            Lookup::Miss => None,
        }
    }

    #[test]
    fn test_fill_and_lookup() {
        let store = store(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();
        let key = key(id, 1, 8);
        let value = occurrences(id, 3);

        let ticket = miss_ticket(&store, &key);
        assert!(store.fill(key, Arc::clone(&value), TTL, ticket).unwrap());

        let cached = hit(&store, &key).unwrap();
        assert!(Arc::ptr_eq(&cached, &value));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_nonexistent() {
        let store = store(TEST_MAX_ENTRIES);
        assert!(hit(&store, &key(Uuid::new_v4(), 1, 8)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_ttl_expiration() {
        let store = store(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();
        let key = key(id, 1, 8);

        let ticket = miss_ticket(&store, &key);
        store
            .fill(key, occurrences(id, 1), Duration::from_millis(50), ticket)
            .unwrap();

        // Should exist immediately
        assert!(hit(&store, &key).is_some());

        thread::sleep(Duration::from_millis(100));

        // Should be expired now
        assert!(hit(&store, &key).is_none());
    }

    #[test]
    fn test_evict_template_removes_every_window() {
        let store = store(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let keys = [key(id, 1, 8), key(id, 8, 15), key(other, 1, 8)];

        for key in keys {
            let ticket = miss_ticket(&store, &key);
            store.fill(key, occurrences(key.template_id, 1), TTL, ticket).unwrap();
        }
        assert_eq!(store.template_count(), 2);

        let evicted = store.evict_template(id).unwrap();

        assert_eq!(evicted, 2);
        assert!(hit(&store, &keys[0]).is_none());
        assert!(hit(&store, &keys[1]).is_none());
        assert!(hit(&store, &keys[2]).is_some());
        assert_eq!(store.template_count(), 1);
    }

    #[test]
    fn test_evict_unknown_template() {
        let store = store(TEST_MAX_ENTRIES);
        assert_eq!(store.evict_template(Uuid::new_v4()).unwrap(), 0);
    }

    #[test]
    fn test_fill_after_invalidation_is_discarded() {
        let store = store(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();
        let key = key(id, 1, 8);

        // A reader misses and starts generating...
        let stale_ticket = miss_ticket(&store, &key);
        // ...while a writer invalidates the template.
        store.evict_template(id).unwrap();

        let stored = store.fill(key, occurrences(id, 5), TTL, stale_ticket).unwrap();

        assert!(!stored);
        assert!(hit(&store, &key).is_none());

        // A fresh miss can fill again.
        let ticket = miss_ticket(&store, &key);
        assert!(store.fill(key, occurrences(id, 2), TTL, ticket).unwrap());
        assert_eq!(hit(&store, &key).unwrap().len(), 2);
    }

    #[test]
    fn test_ticket_taken_before_invalidation_is_stale_after_miss() {
        let store = store(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();
        let key = key(id, 1, 8);

        // A reader stamps its read before loading the template...
        let ticket = store.ticket().unwrap();
        // ...a writer invalidates before the reader reaches the cache...
        store.evict_template(id).unwrap();
        // ...and the reader's lookup still misses.
        assert!(matches!(store.lookup(&key).unwrap(), Lookup::Miss));

        let stored = store.fill(key, occurrences(id, 5), TTL, ticket).unwrap();

        assert!(!stored);
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_single_index_entry() {
        let store = store(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();
        let key = key(id, 1, 8);

        for count in [1, 2] {
            let ticket = store.ticket().unwrap();
            store.fill(key, occurrences(id, count), TTL, ticket).unwrap();
        }

        assert_eq!(store.len(), 1);
        assert_eq!(hit(&store, &key).unwrap().len(), 2);
        assert_eq!(store.evict_template(id).unwrap(), 1);
    }

    #[test]
    fn test_lru_eviction_updates_index() {
        // Create a store with only 2 entries max
        let store = store(2);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();

        for id in [first, second, third] {
            let key = key(id, 1, 8);
            let ticket = miss_ticket(&store, &key);
            store.fill(key, occurrences(id, 1), TTL, ticket).unwrap();
        }

        // The oldest entry is gone, and so is its index entry.
        assert!(hit(&store, &key(first, 1, 8)).is_none());
        assert!(hit(&store, &key(second, 1, 8)).is_some());
        assert!(hit(&store, &key(third, 1, 8)).is_some());
        assert_eq!(store.template_count(), 2);
        assert_eq!(store.evict_template(first).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_readers_and_invalidation() {
        let store = store(TEST_MAX_ENTRIES);
        let id = Uuid::new_v4();
        let key = key(id, 1, 8);
        let ticket = miss_ticket(&store, &key);
        store.fill(key, occurrences(id, 1), TTL, ticket).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.lookup(&key).unwrap();
                    }
                })
            })
            .collect();
        store.evict_template(id).unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert!(hit(&store, &key).is_none());
    }
}
