//! Read-through and invalidation

use crate::cache_aside::keys::{entity_key, list_pattern};
use crate::kvs::KeyValueStore;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifetime of a cached query result
pub const DEFAULT_QUERY_TTL_SECS: u64 = 300;

/// Memoizes source-of-truth reads in a key-value store
pub struct CacheAside {
    store: Arc<dyn KeyValueStore>,
    ttl_seconds: u64,
    stats: CacheStats,
    /// Bumped by every invalidation, before any key is removed
    generation: AtomicU64,
}

impl CacheAside {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_seconds: u64) -> Self {
        Self {
            store,
            ttl_seconds,
            stats: CacheStats::default(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_default_ttl(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_QUERY_TTL_SECS)
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Invalidation generation; read it before loading from the source of truth
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cached value for `key`, or None on miss, store failure or bad payload
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match self.store.get(key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Cache read failed, falling back to source");
                return None;
            }
        };

        match serde_json::from_slice(&payload) {
            Ok(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                self.stats.decode_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Cached payload unreadable, treating as miss");
                None
            }
        }
    }

    /// Store `value` under `key` only if no invalidation happened since
    /// `observed` was read from [`generation`](Self::generation)
    ///
    /// An invalidation racing the write removes the key again, either here or
    /// through its own deletes. Returns true when the value stayed cached.
    pub fn populate_if_current<T: Serialize>(&self, key: &str, value: &T, observed: u64) -> bool {
        if self.generation() != observed {
            self.stats.stale_discards.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Skipping cache write, source changed during load");
            return false;
        }

        if !self.populate(key, value) {
            return false;
        }

        if self.generation() != observed {
            self.stats.stale_discards.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Source changed during cache write, dropping entry");
            if let Err(e) = self.store.delete_key(key) {
                self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Failed to drop stale cache entry");
            }
            return false;
        }
        true
    }

    /// Store `value` under `key` with the query TTL; failures are logged only
    ///
    /// Returns true when the value was written.
    pub fn populate<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize value for cache");
                return false;
            }
        };

        match self.store.set(key, payload, Some(self.ttl_seconds)) {
            Ok(()) => {
                debug!(key = %key, ttl = self.ttl_seconds, "Cached value");
                true
            }
            Err(e) => {
                self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Serve `key` from the cache, or call `load` and cache its result
    ///
    /// Errors from `load` are returned unchanged and nothing is cached. A
    /// result loaded while an invalidation ran is returned but not cached.
    pub fn read_through<T, E, F>(&self, key: &str, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(cached) = self.lookup(key) {
            return Ok(cached);
        }

        let observed = self.generation();
        let fresh = load()?;
        self.populate_if_current(key, &fresh, observed);
        Ok(fresh)
    }

    /// Drop cached data made stale by a write
    ///
    /// Removes the entity key when `id` is known, then every list query key,
    /// whatever fields the write touched. Returns the number of keys removed.
    pub fn invalidate(&self, id: Option<&str>) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut removed = 0;

        if let Some(id) = id {
            let key = entity_key(id);
            match self.store.delete_key(&key) {
                Ok(n) => removed += n,
                Err(e) => {
                    self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %key, error = %e, "Failed to invalidate entity cache");
                }
            }
        }

        match self.store.keys(&list_pattern()) {
            Ok(keys) if keys.is_empty() => {}
            Ok(keys) => match self.store.delete(&keys) {
                Ok(n) => {
                    removed += n;
                    info!(count = n, "Invalidated list query cache");
                }
                Err(e) => {
                    self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %e, "Failed to delete list query keys");
                }
            },
            Err(e) => {
                self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Failed to enumerate list query keys");
            }
        }

        self.stats.invalidated.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }
}

/// Cache-aside counters
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    store_errors: AtomicU64,
    decode_errors: AtomicU64,
    invalidated: AtomicU64,
    stale_discards: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn store_errors(&self) -> u64 {
        self.store_errors.load(Ordering::Relaxed)
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    pub fn invalidated(&self) -> u64 {
        self.invalidated.load(Ordering::Relaxed)
    }

    /// Loaded values not cached because an invalidation overlapped the load
    pub fn stale_discards(&self) -> u64 {
        self.stale_discards.load(Ordering::Relaxed)
    }

    /// Hits over all lookups that reached a verdict
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses() + self.decode_errors();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
