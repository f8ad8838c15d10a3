//! Boatyard Core - caching and request admission for the boat API
//!
//! This crate provides:
//! - An in-memory key-value store with per-key expiry and atomic counters
//! - A cache-aside layer with coarse invalidation on writes
//! - A fixed-window per-client rate limiter
//! - The boat domain model, validation and repository contract

pub mod boat;
pub mod cache_aside;
pub mod clock;
pub mod config;
pub mod error;
pub mod kvs;
pub mod monitoring;
pub mod ratelimit;
pub mod service;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use boat::{Boat, BoatFilter, BoatInput, BoatRepository, InMemoryBoatRepository};
pub use cache_aside::{CacheAside, CacheStats};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{BoatyardConfig, ConfigManager};
pub use error::{RepositoryError, ServiceError, ServiceResult, ValidationErrors};
pub use kvs::{ExpirySweeper, InfoReport, KeyValueStore, MemoryStore, StoreError, StoreResult};
pub use ratelimit::{RateLimitConfig, RateLimitDecision, RateLimiter};
pub use service::BoatService;
