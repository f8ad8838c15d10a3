//! Stored values with expiry metadata

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};

/// Per-entry bookkeeping overhead counted towards `used_memory`
const ENTRY_OVERHEAD_BYTES: usize = 48;

/// A value held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Opaque payload
    pub value: Bytes,
    /// Absolute expiry instant (None = never expires)
    pub expires_at: Option<DateTime<Utc>>,
    /// Approximate footprint of key + value + overhead
    pub size_bytes: usize,
}

impl Entry {
    /// Create an entry without expiry
    pub fn new(key: &str, value: Bytes) -> Self {
        let size_bytes = key.len() + value.len() + ENTRY_OVERHEAD_BYTES;
        Self {
            value,
            expires_at: None,
            size_bytes,
        }
    }

    /// Create an entry expiring `ttl_seconds` after `now`
    pub fn with_ttl(key: &str, value: Bytes, now: DateTime<Utc>, ttl_seconds: u64) -> Self {
        let mut entry = Self::new(key, value);
        entry.expires_at = Some(deadline(now, ttl_seconds));
        entry
    }

    /// An entry is expired once its deadline has been reached
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    /// Reset the expiry relative to `now`
    pub fn update_ttl(&mut self, now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
        let expires_at = deadline(now, ttl_seconds);
        self.expires_at = Some(expires_at);
        expires_at
    }

    /// Replace the payload, keeping the expiry
    pub fn replace_value(&mut self, key: &str, value: Bytes) {
        self.size_bytes = key.len() + value.len() + ENTRY_OVERHEAD_BYTES;
        self.value = value;
    }

    /// Remaining whole seconds before expiry, -1 when the entry never expires
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        match self.expires_at {
            Some(expires_at) => expires_at.signed_duration_since(now).num_seconds().max(0),
            None => -1,
        }
    }
}

/// `now + ttl_seconds`, saturating at the latest representable instant
fn deadline(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let now = Utc::now();
        let entry = Entry::new("k", Bytes::from_static(b"v"));

        assert!(!entry.is_expired(now + Duration::days(3650)));
        assert_eq!(entry.remaining_secs(now), -1);
    }

    #[test]
    fn test_entry_expires_at_deadline() {
        let now = Utc::now();
        let entry = Entry::with_ttl("k", Bytes::from_static(b"v"), now, 10);

        assert!(!entry.is_expired(now + Duration::milliseconds(9_999)));
        assert!(entry.is_expired(now + Duration::seconds(10)));
    }

    #[test]
    fn test_entry_replace_value_keeps_expiry() {
        let now = Utc::now();
        let mut entry = Entry::with_ttl("k", Bytes::from_static(b"1"), now, 60);
        let expires_at = entry.expires_at;

        entry.replace_value("k", Bytes::from_static(b"200"));
        assert_eq!(entry.expires_at, expires_at);
        assert_eq!(entry.size_bytes, 1 + 3 + ENTRY_OVERHEAD_BYTES);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let now = Utc::now();
        let entry = Entry::with_ttl("k", Bytes::from_static(b"v"), now, u64::MAX);

        assert_eq!(entry.expires_at, Some(DateTime::<Utc>::MAX_UTC));
        assert!(!entry.is_expired(now));
    }
}
