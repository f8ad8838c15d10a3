//! HTTP API handlers organized by resource

pub mod boats;
pub mod cache;
pub mod system;

pub(crate) use boats::{create_boat, delete_boat, get_boat, list_boats, update_boat};
pub(crate) use cache::{cache_health, cache_stats, clear_cache};
pub(crate) use system::{health, route_not_found};
