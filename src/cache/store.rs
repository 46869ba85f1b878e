//! Cache Store Module
//!
//! Fixed-capacity slot array with per-slot readers–writers locking and
//! insert-ordered LRU eviction.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedRwLockReadGuard, RwLock};
use tracing::{debug, info};

use crate::cache::lru::{promoted_rank, VictimScan};
use crate::cache::{CacheEntry, CacheStats, StatCounters, MAX_URI_LENGTH};
use crate::config::Config;
use crate::error::{ProxyError, Result};

type Slot = Arc<RwLock<CacheEntry>>;

// == Slot Handle ==
/// Shared read access to one cache slot, returned by [`CacheStore::find`].
///
/// Writers to this slot are held off until the handle is released or dropped.
/// Other slots are unaffected.
#[derive(Debug)]
pub struct SlotHandle {
    index: usize,
    guard: OwnedRwLockReadGuard<CacheEntry>,
}

impl SlotHandle {
    /// Index of the slot this handle pins.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cached response bytes.
    pub fn body(&self) -> &[u8] {
        &self.guard.body
    }

    /// URI the body was stored under.
    pub fn uri(&self) -> &str {
        &self.guard.uri
    }

    /// Ends shared access. Equivalent to dropping the handle.
    pub fn release(self) {}
}

// == Slot Info ==
/// Read-only view of one slot for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SlotInfo {
    pub index: usize,
    pub uri: String,
    pub size: usize,
    pub recency: i64,
    pub allocated: bool,
}

// == Cache Store ==
/// Concurrency-safe response cache keyed by request URI.
///
/// Lookups only take per-slot shared locks and run fully in parallel.
/// Inserts are serialised by a cache-wide claim lock so that picking a
/// victim and writing to it happen as one step.
#[derive(Debug)]
pub struct CacheStore {
    /// Fixed slot array
    slots: Vec<Slot>,
    /// Held for the whole insert path
    claim: Mutex<()>,
    /// Performance statistics
    stats: StatCounters,
    /// Largest body a slot may hold
    max_object_size: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a cache with `capacity` empty slots.
    ///
    /// A capacity of zero is raised to one so eviction always has a victim.
    pub fn new(capacity: usize, max_object_size: usize) -> Self {
        let slots = (0..capacity.max(1))
            .map(|_| Arc::new(RwLock::new(CacheEntry::empty())))
            .collect();
        Self {
            slots,
            claim: Mutex::new(()),
            stats: StatCounters::new(),
            max_object_size,
        }
    }

    /// Creates a cache sized from the configured budget and object ceiling.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_capacity(), config.max_object_size)
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Largest body accepted by [`insert`](Self::insert).
    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }

    // == Find ==
    /// Looks up `uri`, returning a handle that keeps the slot shared-locked.
    ///
    /// Each slot is shared-locked only while it is compared; the matching
    /// slot stays locked inside the returned handle.
    pub async fn find(&self, uri: &str) -> Option<SlotHandle> {
        for (index, slot) in self.slots.iter().enumerate() {
            let guard = Arc::clone(slot).read_owned().await;
            if guard.matches(uri) {
                self.stats.record_hit();
                return Some(SlotHandle { index, guard });
            }
        }
        self.stats.record_miss();
        None
    }

    // == Insert ==
    /// Stores `body` under `uri` and returns the slot index written.
    ///
    /// An existing entry for the same URI is overwritten in place; otherwise
    /// the first free slot, or the stalest one, is taken. The written slot
    /// becomes the most recent and every other slot decays by one.
    pub async fn insert(&self, uri: &str, body: &[u8]) -> Result<usize> {
        if body.len() > self.max_object_size {
            return Err(ProxyError::ObjectTooLarge {
                size: body.len(),
                limit: self.max_object_size,
            });
        }
        if uri.len() > MAX_URI_LENGTH {
            return Err(ProxyError::UriTooLong {
                len: uri.len(),
                limit: MAX_URI_LENGTH,
            });
        }

        let _claim = self.claim.lock().await;
        let index = self.select_victim(uri).await;

        let mut entry = self.slots[index].write().await;
        if entry.allocated && entry.uri != uri {
            info!("Evicting {} ({} bytes) from slot {}", entry.uri, entry.body.len(), index);
            self.stats.record_eviction();
        }
        entry.overwrite(uri, body);
        entry.recency = promoted_rank(self.capacity());
        self.demote_others(index).await;
        drop(entry);

        self.stats.record_insert();
        debug!("Cached {} ({} bytes) in slot {}", uri, body.len(), index);
        Ok(index)
    }

    /// Picks the slot to write for `uri`. Caller must hold the claim lock.
    async fn select_victim(&self, uri: &str) -> usize {
        let mut scan = VictimScan::new();
        let mut free = None;
        for (index, slot) in self.slots.iter().enumerate() {
            let entry = slot.read().await;
            if entry.matches(uri) {
                return index;
            }
            if free.is_none() {
                free = scan.observe(index, entry.allocated, entry.recency);
            }
        }
        free.or_else(|| scan.finish()).unwrap_or(0)
    }

    /// Decrements the rank of every slot except `promoted`.
    async fn demote_others(&self, promoted: usize) {
        for (index, slot) in self.slots.iter().enumerate() {
            if index != promoted {
                slot.write().await.recency -= 1;
            }
        }
    }

    // == Snapshot ==
    /// Returns every slot's metadata in index order.
    pub async fn snapshot(&self) -> Vec<SlotInfo> {
        let mut out = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            let entry = slot.read().await;
            out.push(SlotInfo {
                index,
                uri: entry.uri.clone(),
                size: entry.body.len(),
                recency: entry.recency,
                allocated: entry.allocated,
            });
        }
        out
    }

    // == Length ==
    /// Returns the number of allocated slots.
    pub async fn len(&self) -> usize {
        let mut count = 0;
        for slot in &self.slots {
            if slot.read().await.allocated {
                count += 1;
            }
        }
        count
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let total = self.len().await;
        self.stats.snapshot(total, self.capacity())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const OBJECT: usize = 1024;

    #[tokio::test]
    async fn test_store_new() {
        let store = CacheStore::new(4, OBJECT);
        assert_eq!(store.capacity(), 4);
        assert_eq!(store.len().await, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_zero_capacity_rounds_up() {
        let store = CacheStore::new(0, OBJECT);
        assert_eq!(store.capacity(), 1);
        store.insert("http://a/", b"a").await.unwrap();
        assert!(store.find("http://a/").await.is_some());
    }

    #[tokio::test]
    async fn test_store_from_config() {
        let config = Config {
            max_cache_size: 10_000,
            max_object_size: 3_000,
            ..Config::default()
        };
        let store = CacheStore::from_config(&config);
        assert_eq!(store.capacity(), 3);
        assert_eq!(store.max_object_size(), 3_000);
    }

    #[tokio::test]
    async fn test_store_insert_and_find() {
        let store = CacheStore::new(4, OBJECT);

        store.insert("http://example.com/", b"hello").await.unwrap();
        let handle = store.find("http://example.com/").await.unwrap();

        assert_eq!(handle.body(), b"hello");
        assert_eq!(handle.uri(), "http://example.com/");
        handle.release();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_find_nonexistent() {
        let store = CacheStore::new(4, OBJECT);
        store.insert("http://example.com/a", b"a").await.unwrap();

        assert!(store.find("http://example.com/b").await.is_none());
    }

    #[tokio::test]
    async fn test_store_fills_free_slots_in_order() {
        let store = CacheStore::new(3, OBJECT);

        assert_eq!(store.insert("http://a/", b"a").await.unwrap(), 0);
        assert_eq!(store.insert("http://b/", b"b").await.unwrap(), 1);
        assert_eq!(store.insert("http://c/", b"c").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_store_lru_eviction() {
        let store = CacheStore::new(3, OBJECT);

        store.insert("http://a/", b"a").await.unwrap();
        store.insert("http://b/", b"b").await.unwrap();
        store.insert("http://c/", b"c").await.unwrap();

        // Cache is full, inserting d evicts a (oldest write)
        let index = store.insert("http://d/", b"d").await.unwrap();

        assert_eq!(index, 0);
        assert_eq!(store.len().await, 3);
        assert!(store.find("http://a/").await.is_none());
        assert!(store.find("http://b/").await.is_some());
        assert!(store.find("http://c/").await.is_some());
        assert!(store.find("http://d/").await.is_some());
    }

    #[tokio::test]
    async fn test_store_lookup_does_not_refresh_recency() {
        let store = CacheStore::new(3, OBJECT);

        store.insert("http://a/", b"a").await.unwrap();
        store.insert("http://b/", b"b").await.unwrap();
        store.insert("http://c/", b"c").await.unwrap();

        // Reading a does not protect it from eviction
        store.find("http://a/").await.unwrap().release();
        store.insert("http://d/", b"d").await.unwrap();

        assert!(store.find("http://a/").await.is_none());
        assert!(store.find("http://b/").await.is_some());
    }

    #[tokio::test]
    async fn test_store_overwrite_same_uri_in_place() {
        let store = CacheStore::new(3, OBJECT);

        let first = store.insert("http://a/", b"old").await.unwrap();
        store.insert("http://b/", b"b").await.unwrap();
        let second = store.insert("http://a/", b"new").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len().await, 2);
        let handle = store.find("http://a/").await.unwrap();
        assert_eq!(handle.body(), b"new");
    }

    #[tokio::test]
    async fn test_store_recency_after_insert() {
        let store = CacheStore::new(4, OBJECT);
        store.insert("http://a/", b"a").await.unwrap();
        store.insert("http://b/", b"b").await.unwrap();

        let before = store.snapshot().await;
        let k = store.insert("http://c/", b"c").await.unwrap();
        let after = store.snapshot().await;

        for (old, new) in before.iter().zip(after.iter()) {
            if new.index == k {
                assert_eq!(new.recency, 5);
            } else {
                assert_eq!(new.recency, old.recency - 1);
                assert!(new.recency < after[k].recency);
            }
        }
    }

    #[tokio::test]
    async fn test_store_object_too_large() {
        let store = CacheStore::new(2, 8);

        let result = store.insert("http://big/", &[0u8; 9]).await;
        assert!(matches!(result, Err(ProxyError::ObjectTooLarge { size: 9, limit: 8 })));
        assert!(store.find("http://big/").await.is_none());

        // Exactly at the ceiling is accepted
        assert!(store.insert("http://fits/", &[0u8; 8]).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_uri_too_long() {
        let store = CacheStore::new(2, OBJECT);
        let long_uri = "x".repeat(MAX_URI_LENGTH + 1);

        let result = store.insert(&long_uri, b"body").await;
        assert!(matches!(result, Err(ProxyError::UriTooLong { .. })));
    }

    #[tokio::test]
    async fn test_store_stats() {
        let store = CacheStore::new(1, OBJECT);

        store.insert("http://a/", b"a").await.unwrap();
        store.find("http://a/").await.unwrap().release(); // hit
        let _ = store.find("http://nope/").await; // miss
        store.insert("http://b/", b"b").await.unwrap(); // evicts a

        let stats = store.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.capacity, 1);
    }

    #[tokio::test]
    async fn test_writer_waits_for_reader() {
        let store = Arc::new(CacheStore::new(1, OBJECT));
        store.insert("http://a/", b"a").await.unwrap();

        let handle = store.find("http://a/").await.unwrap();
        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.insert("http://a/", b"replaced").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!writer.is_finished(), "Writer must wait for the reader");
        assert_eq!(handle.body(), b"a");

        handle.release();
        writer.await.unwrap().unwrap();
        assert_eq!(store.find("http://a/").await.unwrap().body(), b"replaced");
    }

    #[tokio::test]
    async fn test_readers_share_a_slot() {
        let store = CacheStore::new(2, OBJECT);
        store.insert("http://a/", b"a").await.unwrap();

        let first = store.find("http://a/").await.unwrap();
        let second = store.find("http://a/").await.unwrap();
        assert_eq!(first.index(), second.index());
        assert_eq!(first.body(), second.body());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_while_inserting_elsewhere() {
        let store = Arc::new(CacheStore::new(4, OBJECT));
        let body = vec![b'z'; 512];
        store.insert("http://shared/", &body).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let handle = store.find("http://shared/").await.expect("cached");
                handle.body().to_vec()
            }));
        }
        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..8 {
                    let uri = format!("http://other/{}", i % 2);
                    store.insert(&uri, b"other").await.unwrap();
                }
            })
        };

        for task in tasks {
            assert_eq!(task.await.unwrap(), body);
        }
        writer.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_never_clobber() {
        let capacity = 8;
        let store = Arc::new(CacheStore::new(capacity, OBJECT));

        let mut tasks = Vec::new();
        for i in 0..capacity {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let uri = format!("http://host/{}", i);
                store.insert(&uri, uri.as_bytes()).await.unwrap()
            }));
        }
        let mut indexes = Vec::new();
        for task in tasks {
            indexes.push(task.await.unwrap());
        }
        indexes.sort_unstable();
        indexes.dedup();

        // Every insert got its own slot and survived
        assert_eq!(indexes.len(), capacity);
        for i in 0..capacity {
            let uri = format!("http://host/{}", i);
            let handle = store.find(&uri).await.expect("entry was clobbered");
            assert_eq!(handle.body(), uri.as_bytes());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_uri_inserts_keep_one_entry() {
        let store = Arc::new(CacheStore::new(4, OBJECT));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.insert("http://dup/", b"same").await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let allocated: Vec<_> = store
            .snapshot()
            .await
            .into_iter()
            .filter(|slot| slot.allocated)
            .collect();
        assert_eq!(allocated.len(), 1);
        assert_eq!(allocated[0].uri, "http://dup/");
    }
}
