//! Per-client fixed-window request admission
//!
//! Each client gets a counter at `ratelimit:<client>`. The first request of a
//! window creates the counter with the window length as its TTL; later
//! requests only increment it. When the TTL fires the next request opens a
//! fresh window, so windows are anchored to a client's first request rather
//! than to wall-clock boundaries.
//!
//! If the store fails the request is admitted without quota information.

use crate::kvs::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Key prefix for per-client counters
pub const RATE_LIMIT_PREFIX: &str = "ratelimit:";

/// Rate limit settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub max_requests: u64,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

/// Quota state after counting a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u64,
    pub remaining: u64,
    /// Requests seen in the current window, this one included
    pub used: u64,
}

/// Outcome of [`RateLimiter::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed(Quota),
    Limited { quota: Quota, retry_after_secs: u64 },
    /// The store could not be consulted; the request goes through
    FailOpen,
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, RateLimitDecision::Limited { .. })
    }

    pub fn quota(&self) -> Option<Quota> {
        match self {
            RateLimitDecision::Allowed(quota) | RateLimitDecision::Limited { quota, .. } => {
                Some(*quota)
            }
            RateLimitDecision::FailOpen => None,
        }
    }
}

/// Fixed-window limiter backed by a key-value store
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    config: RateLimitConfig,
    rejected: AtomicU64,
    fail_open: AtomicU64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, config: RateLimitConfig) -> Self {
        Self {
            store,
            config,
            rejected: AtomicU64::new(0),
            fail_open: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request from `client_id` and decide whether to admit it
    pub fn check(&self, client_id: &str) -> RateLimitDecision {
        let key = counter_key(client_id);

        let count = match self.store.incr_with_ttl(&key, self.config.window_secs) {
            Ok(count) => u64::try_from(count).unwrap_or(0),
            Err(e) => {
                self.fail_open.fetch_add(1, Ordering::Relaxed);
                warn!(client = %client_id, error = %e, "Rate limit check failed, admitting request");
                return RateLimitDecision::FailOpen;
            }
        };

        let limit = self.config.max_requests;
        let quota = Quota {
            limit,
            remaining: limit.saturating_sub(count),
            used: count,
        };

        if count > limit {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(client = %client_id, count, limit, "Rate limit exceeded");
            return RateLimitDecision::Limited {
                quota,
                retry_after_secs: self.config.window_secs,
            };
        }

        RateLimitDecision::Allowed(quota)
    }

    /// Requests rejected since startup
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Requests admitted because the store failed
    pub fn fail_open_count(&self) -> u64 {
        self.fail_open.load(Ordering::Relaxed)
    }
}

pub fn counter_key(client_id: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client_id)
}
