//! Store doubles for exercising failure paths

use crate::kvs::{InfoReport, KeyValueStore, MemoryStore, StoreError, StoreResult};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};

/// Wraps a [`MemoryStore`] and reports [`StoreError::Unavailable`] on demand
///
/// Reads cover `get`, `keys`, `ping` and `info`; everything else is a write.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FaultyStore {
    /// Every operation fails
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_failures(true, true);
        store
    }

    /// Reads succeed, writes fail
    pub fn failing_writes() -> Self {
        let store = Self::default();
        store.set_failures(false, true);
        store
    }

    pub fn set_failures(&self, reads: bool, writes: bool) {
        self.fail_reads.store(reads, Ordering::SeqCst);
        self.fail_writes.store(writes, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for FaultyStore {
    fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.check_read()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Bytes, ttl_seconds: Option<u64>) -> StoreResult<()> {
        self.check_write()?;
        self.inner.set(key, value, ttl_seconds)
    }

    fn delete(&self, keys: &[String]) -> StoreResult<usize> {
        self.check_write()?;
        self.inner.delete(keys)
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.check_read()?;
        self.inner.keys(pattern)
    }

    fn incr(&self, key: &str) -> StoreResult<i64> {
        self.check_write()?;
        self.inner.incr(key)
    }

    fn expire(&self, key: &str, ttl_seconds: u64) -> StoreResult<bool> {
        self.check_write()?;
        self.inner.expire(key, ttl_seconds)
    }

    fn flush_all(&self) -> StoreResult<()> {
        self.check_write()?;
        self.inner.flush_all()
    }

    fn ping(&self) -> StoreResult<String> {
        self.check_read()?;
        self.inner.ping()
    }

    fn info(&self) -> StoreResult<InfoReport> {
        self.check_read()?;
        self.inner.info()
    }
}
