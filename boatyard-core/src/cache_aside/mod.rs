//! Cache-aside layer over a [`KeyValueStore`](crate::kvs::KeyValueStore)
//!
//! Reads check the store first and fall back to the source of truth on a
//! miss, repopulating the store afterwards. Writes invalidate the affected
//! entity key and every cached list query. Store failures never fail a read
//! or a write; they only cost a trip to the source of truth.

pub mod aside;
pub mod keys;

pub use aside::{CacheAside, CacheStats, DEFAULT_QUERY_TTL_SECS};
pub use keys::{entity_key, list_key, QueryKey, ENTITY_NAMESPACE, LIST_NAMESPACE};
