//! Key-value store with per-key expiry, atomic counters and prefix enumeration
//!
//! The [`KeyValueStore`] trait is the contract the cache-aside layer and the
//! rate limiter are written against. [`MemoryStore`] is the in-process
//! implementation; it never reports [`StoreError::Unavailable`].

pub mod entry;
pub mod error;
pub mod info;
pub mod memory;
pub mod pattern;
pub mod sweeper;
pub mod ttl_manager;

pub use entry::Entry;
pub use error::{StoreError, StoreResult};
pub use info::{format_bytes, InfoReport};
pub use memory::{MemoryStore, StoreStats};
pub use pattern::KeyPattern;
pub use sweeper::ExpirySweeper;
pub use ttl_manager::{ExpirationEntry, TtlManager};

use bytes::Bytes;

/// Token returned by [`KeyValueStore::ping`]
pub const PONG: &str = "PONG";

/// Operations every backing store provides
///
/// All operations are logic-total: missing keys, unmatched patterns and no-op
/// deletes are reported through return values, never as errors.
pub trait KeyValueStore: Send + Sync {
    /// Fetch a live value
    fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Store a value, replacing any previous value and expiry
    fn set(&self, key: &str, value: Bytes, ttl_seconds: Option<u64>) -> StoreResult<()>;

    /// Remove keys, returning how many were live
    fn delete(&self, keys: &[String]) -> StoreResult<usize>;

    /// Live keys matching `*`, `prefix*` or an exact key
    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Atomically add one to the integer at `key` (absent counts as 0)
    fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Set or reset the expiry of a live key; false if the key is absent
    fn expire(&self, key: &str, ttl_seconds: u64) -> StoreResult<bool>;

    /// Drop every entry and every pending expiry
    fn flush_all(&self) -> StoreResult<()>;

    fn ping(&self) -> StoreResult<String>;

    fn info(&self) -> StoreResult<InfoReport>;

    /// Remove a single key
    fn delete_key(&self, key: &str) -> StoreResult<usize> {
        self.delete(&[key.to_string()])
    }

    /// Increment and, when this starts a new counter, set its expiry
    ///
    /// Stores that can do both under one lock should override this; the
    /// default issues the two calls back to back.
    fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> StoreResult<i64> {
        let value = self.incr(key)?;
        if value == 1 {
            self.expire(key, ttl_seconds)?;
        }
        Ok(value)
    }
}
