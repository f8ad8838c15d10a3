//! Expiry schedule for the key-value store

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Scheduled expiry of one key
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExpirationEntry {
    /// Store key
    pub key: String,
    /// Deadline recorded when the expiry was scheduled
    pub expires_at: DateTime<Utc>,
}

impl Ord for ExpirationEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest expiration first)
        other
            .expires_at
            .cmp(&self.expires_at)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for ExpirationEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending expirations
///
/// Rescheduling or deleting a key does not remove its old heap entry. The
/// store compares each due entry against the live deadline before removing
/// anything, so a stale entry is simply dropped when it comes due.
#[derive(Debug, Default)]
pub struct TtlManager {
    heap: Mutex<BinaryHeap<ExpirationEntry>>,
}

impl TtlManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` is due at `expires_at`
    pub fn schedule(&self, key: String, expires_at: DateTime<Utc>) {
        self.heap.lock().push(ExpirationEntry { key, expires_at });
    }

    /// Pop every entry whose deadline is at or before `now`
    pub fn drain_due(&self, now: DateTime<Utc>) -> Vec<ExpirationEntry> {
        let mut heap = self.heap.lock();
        let mut due = Vec::new();

        while heap.peek().is_some_and(|entry| entry.expires_at <= now) {
            if let Some(entry) = heap.pop() {
                due.push(entry);
            }
        }

        due
    }

    /// Earliest pending deadline, stale entries included
    pub fn next_expiration(&self) -> Option<DateTime<Utc>> {
        self.heap.lock().peek().map(|entry| entry.expires_at)
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    /// Cancel every pending expiration
    pub fn clear(&self) {
        self.heap.lock().clear();
    }
}
