//! Boat reads and writes through the cache-aside layer

use crate::boat::{parse_filter, validate_input, Boat, BoatInput, BoatRepository, QueryParams};
use crate::cache_aside::{entity_key, list_key, CacheAside};
use crate::clock::SharedClock;
use crate::error::{ServiceError, ServiceResult};
use chrono::Datelike;
use std::sync::Arc;
use tracing::{debug, info};

/// Validates requests, serves reads from cache and invalidates on writes
pub struct BoatService {
    repository: Arc<dyn BoatRepository>,
    cache: CacheAside,
    clock: SharedClock,
}

impl BoatService {
    pub fn new(repository: Arc<dyn BoatRepository>, cache: CacheAside, clock: SharedClock) -> Self {
        Self {
            repository,
            cache,
            clock,
        }
    }

    pub fn cache(&self) -> &CacheAside {
        &self.cache
    }

    pub fn repository(&self) -> &Arc<dyn BoatRepository> {
        &self.repository
    }

    fn current_year(&self) -> i32 {
        self.clock.now().year()
    }

    /// Boats matching the query parameters, newest first
    pub fn list(&self, params: &QueryParams) -> ServiceResult<Vec<Boat>> {
        let filter = parse_filter(params, self.current_year())?;
        let key = list_key(&filter);
        debug!(key = %key, "Listing boats");

        self.cache
            .read_through(&key, || self.repository.query_by_filter(&filter))
            .map_err(ServiceError::from)
    }

    /// A single boat, or None when it does not exist
    ///
    /// Missing boats are not cached.
    pub fn get(&self, id: &str) -> ServiceResult<Option<Boat>> {
        let key = entity_key(id);
        if let Some(boat) = self.cache.lookup::<Boat>(&key) {
            return Ok(Some(boat));
        }

        let observed = self.cache.generation();
        let boat = self.repository.get_by_id(id)?;
        if let Some(boat) = &boat {
            self.cache.populate_if_current(&key, boat, observed);
        }
        Ok(boat)
    }

    pub fn create(&self, input: &BoatInput) -> ServiceResult<Boat> {
        let fields = validate_input(input, self.current_year())?;
        let boat = self.repository.create(fields)?;

        self.cache.invalidate(None);
        info!(id = %boat.id, "Created boat");
        Ok(boat)
    }

    pub fn update(&self, id: &str, input: &BoatInput) -> ServiceResult<Boat> {
        let fields = validate_input(input, self.current_year())?;
        if self.repository.get_by_id(id)?.is_none() {
            return Err(ServiceError::NotFound(id.to_string()));
        }

        let boat = self.repository.update(id, fields)?;
        self.cache.invalidate(Some(id));
        info!(id = %id, "Updated boat");
        Ok(boat)
    }

    pub fn delete(&self, id: &str) -> ServiceResult<Boat> {
        if self.repository.get_by_id(id)?.is_none() {
            return Err(ServiceError::NotFound(id.to_string()));
        }

        let boat = self.repository.delete(id)?;
        self.cache.invalidate(Some(id));
        info!(id = %id, "Deleted boat");
        Ok(boat)
    }
}
