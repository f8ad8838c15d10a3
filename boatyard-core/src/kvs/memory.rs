//! In-memory store implementation

use crate::clock::{SharedClock, SystemClock};
use crate::kvs::entry::Entry;
use crate::kvs::error::{StoreError, StoreResult};
use crate::kvs::info::{format_bytes, InfoReport};
use crate::kvs::pattern::KeyPattern;
use crate::kvs::ttl_manager::TtlManager;
use crate::kvs::{KeyValueStore, PONG};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Concurrent in-memory store
///
/// Each key lives in one DashMap shard, so every single-key operation runs
/// under that shard's lock and is linearizable. Expired entries are treated
/// as absent on every read path and physically removed either there or by
/// [`MemoryStore::purge_expired`].
#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    ttl_manager: TtlManager,
    clock: SharedClock,
    stats: StoreStats,
    started_at: DateTime<Utc>,
}

impl MemoryStore {
    /// Create a store reading time from `clock`
    pub fn new(clock: SharedClock) -> Self {
        let started_at = clock.now();
        Self {
            entries: DashMap::new(),
            ttl_manager: TtlManager::new(),
            clock,
            stats: StoreStats::default(),
            started_at,
        }
    }

    /// Create a store on wall-clock time
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Remaining seconds for `key`: -1 without expiry, None when absent
    pub fn ttl(&self, key: &str) -> Option<i64> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            None
        } else {
            Some(entry.remaining_secs(now))
        }
    }

    /// Physical entry count, including expired entries not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Physically remove every entry whose deadline has passed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        for due in self.ttl_manager.drain_due(now) {
            if self.remove_if_expired(&due.key, now) {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "Purged expired keys");
        }
        removed
    }

    fn remove_if_expired(&self, key: &str, now: DateTime<Utc>) -> bool {
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some();
        if removed {
            self.stats.expired_keys.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    fn used_memory(&self) -> usize {
        self.entries.iter().map(|entry| entry.size_bytes).sum()
    }

    fn increment(&self, key: &str, ttl_if_new: Option<u64>) -> StoreResult<i64> {
        self.stats.record_command();
        let now = self.clock.now();

        let (value, scheduled) = match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) if !occupied.get().is_expired(now) => {
                let entry = occupied.get_mut();
                let current = parse_integer(&entry.value).ok_or_else(|| StoreError::NotAnInteger {
                    key: key.to_string(),
                })?;
                let next = current.checked_add(1).ok_or_else(|| StoreError::Overflow {
                    key: key.to_string(),
                })?;
                entry.replace_value(key, Bytes::from(next.to_string()));
                (next, None)
            }
            MapEntry::Occupied(mut occupied) => {
                // Expired counter: start over as if absent
                self.stats.expired_keys.fetch_add(1, Ordering::Relaxed);
                let fresh = fresh_counter(key, now, ttl_if_new);
                let scheduled = fresh.expires_at;
                occupied.insert(fresh);
                (1, scheduled)
            }
            MapEntry::Vacant(vacant) => {
                let fresh = fresh_counter(key, now, ttl_if_new);
                let scheduled = fresh.expires_at;
                vacant.insert(fresh);
                (1, scheduled)
            }
        };

        if let Some(expires_at) = scheduled {
            self.ttl_manager.schedule(key.to_string(), expires_at);
        }
        Ok(value)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_system_clock()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        self.stats.record_command();
        let now = self.clock.now();

        let found = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired(now), entry.value.clone()));

        match found {
            Some((false, value)) => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            Some((true, _)) => {
                self.remove_if_expired(key, now);
                self.stats.record_miss();
                Ok(None)
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: Bytes, ttl_seconds: Option<u64>) -> StoreResult<()> {
        self.stats.record_command();
        let now = self.clock.now();

        let entry = match ttl_seconds {
            Some(ttl) => Entry::with_ttl(key, value, now, ttl),
            None => Entry::new(key, value),
        };

        let scheduled = entry.expires_at;
        self.entries.insert(key.to_string(), entry);
        // Schedule after the insert; flush_all clears deadlines before entries
        if let Some(expires_at) = scheduled {
            self.ttl_manager.schedule(key.to_string(), expires_at);
        }
        Ok(())
    }

    fn delete(&self, keys: &[String]) -> StoreResult<usize> {
        self.stats.record_command();
        let now = self.clock.now();

        let deleted = keys
            .iter()
            .filter_map(|key| self.entries.remove(key.as_str()))
            .filter(|(_, entry)| !entry.is_expired(now))
            .count();

        Ok(deleted)
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.stats.record_command();
        let now = self.clock.now();
        let pattern = KeyPattern::parse(pattern);

        if pattern == KeyPattern::Unsupported {
            debug!("Unsupported key pattern, returning no keys");
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now) && pattern.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort_unstable();

        Ok(keys)
    }

    fn incr(&self, key: &str) -> StoreResult<i64> {
        self.increment(key, None)
    }

    fn expire(&self, key: &str, ttl_seconds: u64) -> StoreResult<bool> {
        self.stats.record_command();
        let now = self.clock.now();

        let updated = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => Some(entry.update_ttl(now, ttl_seconds)),
            Some(_) => None,
            None => return Ok(false),
        };

        match updated {
            Some(expires_at) => {
                self.ttl_manager.schedule(key.to_string(), expires_at);
                Ok(true)
            }
            None => {
                self.remove_if_expired(key, now);
                Ok(false)
            }
        }
    }

    fn flush_all(&self) -> StoreResult<()> {
        self.stats.record_command();
        // Deadlines before entries; writers insert before scheduling
        self.ttl_manager.clear();
        self.entries.clear();
        Ok(())
    }

    fn ping(&self) -> StoreResult<String> {
        self.stats.record_command();
        Ok(PONG.to_string())
    }

    fn info(&self) -> StoreResult<InfoReport> {
        self.stats.record_command();
        let now = self.clock.now();

        let (mut live, mut volatile) = (0usize, 0usize);
        for entry in self.entries.iter() {
            if entry.is_expired(now) {
                continue;
            }
            live += 1;
            if entry.expires_at.is_some() {
                volatile += 1;
            }
        }
        let used_memory = self.used_memory();
        let uptime = now.signed_duration_since(self.started_at).num_seconds().max(0);

        let mut report = InfoReport::new();
        report.insert("server", "kvs_version", env!("CARGO_PKG_VERSION"));
        report.insert("server", "kvs_mode", "standalone");
        report.insert("server", "uptime_in_seconds", uptime);
        report.insert("memory", "used_memory", used_memory);
        report.insert("memory", "used_memory_human", format_bytes(used_memory));
        report.insert("stats", "keyspace_hits", self.stats.hits());
        report.insert("stats", "keyspace_misses", self.stats.misses());
        report.insert("stats", "expired_keys", self.stats.expired_keys());
        report.insert("stats", "total_commands_processed", self.stats.commands());
        report.insert("keyspace", "keys", live);
        report.insert("keyspace", "expires", volatile);

        Ok(report)
    }

    fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> StoreResult<i64> {
        self.increment(key, Some(ttl_seconds))
    }
}

fn fresh_counter(key: &str, now: DateTime<Utc>, ttl: Option<u64>) -> Entry {
    let one = Bytes::from_static(b"1");
    match ttl {
        Some(ttl) => Entry::with_ttl(key, one, now, ttl),
        None => Entry::new(key, one),
    }
}

fn parse_integer(value: &[u8]) -> Option<i64> {
    std::str::from_utf8(value).ok()?.parse().ok()
}

/// Store counters reported through `info()`
#[derive(Debug, Default)]
pub struct StoreStats {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_keys: AtomicU64,
    commands: AtomicU64,
}

impl StoreStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn expired_keys(&self) -> u64 {
        self.expired_keys.load(Ordering::Relaxed)
    }

    pub fn commands(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::collections::HashSet;

    fn store_with_clock() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::default();
        (MemoryStore::new(Arc::new(clock.clone())), clock)
    }

    fn bytes(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_get_missing_key_is_absent() {
        let (store, _) = store_with_clock();
        assert_eq!(store.get("nope").unwrap(), None);
        assert_eq!(store.stats().misses(), 1);
    }

    #[test]
    fn test_set_overwrites_value_and_expiry() {
        let (store, clock) = store_with_clock();

        store.set("k", bytes("a"), Some(5)).unwrap();
        store.set("k", bytes("b"), None).unwrap();
        clock.advance_secs(10);

        assert_eq!(store.get("k").unwrap(), Some(bytes("b")));
        assert_eq!(store.ttl("k"), Some(-1));
    }

    #[test]
    fn test_value_visible_until_deadline() {
        let (store, clock) = store_with_clock();
        store.set("k", bytes("v"), Some(10)).unwrap();

        clock.advance(chrono::Duration::milliseconds(9_999));
        assert_eq!(store.get("k").unwrap(), Some(bytes("v")));

        clock.advance(chrono::Duration::milliseconds(1));
        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.keys("*").unwrap().is_empty());
    }

    #[test]
    fn test_expired_key_excluded_from_keys_before_purge() {
        let (store, clock) = store_with_clock();
        store.set("short", bytes("1"), Some(1)).unwrap();
        store.set("long", bytes("2"), None).unwrap();

        clock.advance_secs(2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys("*").unwrap(), vec!["long".to_string()]);
    }

    #[test]
    fn test_keys_prefix() {
        let (store, _) = store_with_clock();
        for key in ["boats:{}", "boats:{\"type\":\"x\"}", "boat:1", "ratelimit:ip"] {
            store.set(key, bytes("v"), None).unwrap();
        }

        let keys = store.keys("boats:*").unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with("boats:")));
        assert!(store.keys("a*b*").unwrap().is_empty());
        assert_eq!(store.keys("boat:1").unwrap(), vec!["boat:1".to_string()]);
    }

    #[test]
    fn test_delete_counts_only_existing() {
        let (store, _) = store_with_clock();
        let pair = vec!["k1".to_string(), "k2".to_string()];

        store.set("k1", bytes("1"), None).unwrap();
        store.set("k2", bytes("2"), None).unwrap();
        assert_eq!(store.delete(&pair).unwrap(), 2);

        store.set("k1", bytes("1"), None).unwrap();
        assert_eq!(store.delete(&pair).unwrap(), 1);
        assert_eq!(store.delete(&pair).unwrap(), 0);
    }

    #[test]
    fn test_delete_does_not_count_expired() {
        let (store, clock) = store_with_clock();
        store.set("k", bytes("1"), Some(1)).unwrap();
        clock.advance_secs(1);

        assert_eq!(store.delete_key("k").unwrap(), 0);
    }

    #[test]
    fn test_incr_from_absent() {
        let (store, _) = store_with_clock();

        assert_eq!(store.incr("counter").unwrap(), 1);
        assert_eq!(store.incr("counter").unwrap(), 2);
        assert_eq!(store.get("counter").unwrap(), Some(bytes("2")));
        assert_eq!(store.ttl("counter"), Some(-1));
    }

    #[test]
    fn test_incr_preserves_expiry() {
        let (store, clock) = store_with_clock();
        store.incr("c").unwrap();
        assert!(store.expire("c", 60).unwrap());

        clock.advance_secs(30);
        assert_eq!(store.incr("c").unwrap(), 2);
        assert_eq!(store.ttl("c"), Some(30));

        clock.advance_secs(30);
        assert_eq!(store.get("c").unwrap(), None);
        assert_eq!(store.incr("c").unwrap(), 1);
    }

    #[test]
    fn test_incr_rejects_non_integer() {
        let (store, _) = store_with_clock();
        store.set("text", bytes("hello"), None).unwrap();

        assert_eq!(
            store.incr("text"),
            Err(StoreError::NotAnInteger { key: "text".to_string() })
        );
        assert_eq!(store.get("text").unwrap(), Some(bytes("hello")));
    }

    #[test]
    fn test_incr_overflow() {
        let (store, _) = store_with_clock();
        store.set("max", Bytes::from(i64::MAX.to_string()), None).unwrap();

        assert!(matches!(store.incr("max"), Err(StoreError::Overflow { .. })));
    }

    #[test]
    fn test_incr_with_ttl_only_sets_expiry_on_first_increment() {
        let (store, clock) = store_with_clock();

        assert_eq!(store.incr_with_ttl("rl", 60).unwrap(), 1);
        clock.advance_secs(20);
        assert_eq!(store.incr_with_ttl("rl", 60).unwrap(), 2);
        assert_eq!(store.ttl("rl"), Some(40));

        clock.advance_secs(40);
        assert_eq!(store.incr_with_ttl("rl", 60).unwrap(), 1);
        assert_eq!(store.ttl("rl"), Some(60));
    }

    #[test]
    fn test_concurrent_incr_is_atomic() {
        let store = Arc::new(MemoryStore::with_system_clock());
        let threads = 8;
        let per_thread = 250;

        let mut seen: Vec<i64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let store = Arc::clone(&store);
                    scope.spawn(move || {
                        (0..per_thread)
                            .map(|_| store.incr("shared").unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        seen.sort_unstable();
        let expected: Vec<i64> = (1..=(threads * per_thread) as i64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_expire_absent_key() {
        let (store, _) = store_with_clock();
        assert!(!store.expire("missing", 10).unwrap());
    }

    #[test]
    fn test_expire_resets_deadline_without_changing_value() {
        let (store, clock) = store_with_clock();
        store.set("k", bytes("v"), Some(5)).unwrap();

        clock.advance_secs(4);
        assert!(store.expire("k", 10).unwrap());
        clock.advance_secs(5);
        assert_eq!(store.get("k").unwrap(), Some(bytes("v")));

        // The stale 5s heap entry must not remove the rescheduled key
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expire_zero_makes_key_absent() {
        let (store, _) = store_with_clock();
        store.set("k", bytes("v"), None).unwrap();

        assert!(store.expire("k", 0).unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_purge_expired_removes_physically() {
        let (store, clock) = store_with_clock();
        store.set("a", bytes("1"), Some(1)).unwrap();
        store.set("b", bytes("2"), Some(100)).unwrap();
        store.set("c", bytes("3"), None).unwrap();

        clock.advance_secs(2);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().expired_keys(), 1);
    }

    #[test]
    fn test_flush_all_scenario() {
        let (store, _) = store_with_clock();
        let payload = serde_json::to_vec(&serde_json::json!({ "name": "X" })).unwrap();
        store.set("entity:1", Bytes::from(payload), Some(300)).unwrap();

        let cached = store.get("entity:1").unwrap().unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&cached).unwrap();
        assert_eq!(decoded["name"], "X");

        store.flush_all().unwrap();
        assert_eq!(store.get("entity:1").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_entries_set_during_flush_stay_purgeable() {
        let (store, clock) = store_with_clock();

        std::thread::scope(|scope| {
            for t in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..500 {
                        store.set(&format!("k{t}:{}", i % 20), bytes("v"), Some(5)).unwrap();
                        store.incr_with_ttl(&format!("rl{t}"), 5).unwrap();
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..200 {
                    store.flush_all().unwrap();
                }
            });
        });

        clock.advance_secs(6);
        store.purge_expired();
        assert!(store.is_empty());
    }

    #[test]
    fn test_flush_then_set_keeps_expiry_scheduled() {
        let (store, clock) = store_with_clock();
        store.set("k", bytes("1"), Some(5)).unwrap();
        store.flush_all().unwrap();
        store.set("k", bytes("2"), Some(5)).unwrap();

        clock.advance_secs(5);
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_ping_and_info() {
        let (store, clock) = store_with_clock();
        store.set("a", bytes("1234"), Some(10)).unwrap();
        store.set("b", bytes("5678"), None).unwrap();
        store.get("a").unwrap();
        clock.advance_secs(3);

        assert_eq!(store.ping().unwrap(), PONG);

        let info = store.info().unwrap();
        assert_eq!(info.field("server", "kvs_mode"), Some("standalone"));
        assert_eq!(info.field("server", "uptime_in_seconds"), Some("3"));
        assert!(info.field("memory", "used_memory_human").is_some());
        assert_eq!(info.field("keyspace", "keys"), Some("2"));
        assert_eq!(info.field("keyspace", "expires"), Some("1"));
        assert_eq!(info.field("stats", "keyspace_hits"), Some("1"));
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let (store, _) = store_with_clock();
        let keys: HashSet<i64> = ["a", "b", "c"]
            .iter()
            .map(|k| store.incr(k).unwrap())
            .collect();
        assert_eq!(keys, HashSet::from([1]));
    }
}
