//! Statistics report combining store, cache and limiter counters

use crate::cache_aside::CacheStats;
use crate::kvs::{InfoReport, KeyValueStore, StoreResult};
use crate::ratelimit::RateLimiter;

/// Store `info()` extended with `cache` and `ratelimit` sections
pub fn collect_stats(
    store: &dyn KeyValueStore,
    cache: &CacheStats,
    limiter: Option<&RateLimiter>,
) -> StoreResult<InfoReport> {
    let mut report = store.info()?;

    report.insert("cache", "hits", cache.hits());
    report.insert("cache", "misses", cache.misses());
    report.insert("cache", "store_errors", cache.store_errors());
    report.insert("cache", "decode_errors", cache.decode_errors());
    report.insert("cache", "invalidated_keys", cache.invalidated());
    report.insert("cache", "stale_discards", cache.stale_discards());
    report.insert("cache", "hit_rate", format!("{:.4}", cache.hit_rate()));

    if let Some(limiter) = limiter {
        let config = limiter.config();
        report.insert("ratelimit", "max_requests", config.max_requests);
        report.insert("ratelimit", "window_secs", config.window_secs);
        report.insert("ratelimit", "rejected_requests", limiter.rejected());
        report.insert("ratelimit", "fail_open_requests", limiter.fail_open_count());
    }

    Ok(report)
}
