//! Source-of-truth contract and the in-memory implementation

use crate::boat::model::{Boat, BoatFields, BoatFilter};
use crate::clock::SharedClock;
use crate::error::RepositoryError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Authoritative boat storage
pub trait BoatRepository: Send + Sync {
    /// Boats matching `filter`, newest first
    fn query_by_filter(&self, filter: &BoatFilter) -> Result<Vec<Boat>, RepositoryError>;

    fn get_by_id(&self, id: &str) -> Result<Option<Boat>, RepositoryError>;

    fn create(&self, fields: BoatFields) -> Result<Boat, RepositoryError>;

    /// Replace the fields of an existing boat
    fn update(&self, id: &str, fields: BoatFields) -> Result<Boat, RepositoryError>;

    /// Remove a boat, returning the removed record
    fn delete(&self, id: &str) -> Result<Boat, RepositoryError>;

    /// Whether the backend can serve requests
    fn is_reachable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct StoredBoat {
    boat: Boat,
    /// Insertion sequence, breaks `created_at` ties
    seq: u64,
}

/// Process-local boat storage
#[derive(Debug)]
pub struct InMemoryBoatRepository {
    boats: RwLock<HashMap<String, StoredBoat>>,
    next_seq: AtomicU64,
    clock: SharedClock,
}

impl InMemoryBoatRepository {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            boats: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.boats.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.boats.read().is_empty()
    }
}

impl BoatRepository for InMemoryBoatRepository {
    fn query_by_filter(&self, filter: &BoatFilter) -> Result<Vec<Boat>, RepositoryError> {
        let boats = self.boats.read();
        let mut matching: Vec<&StoredBoat> = boats
            .values()
            .filter(|stored| filter.matches(&stored.boat))
            .collect();

        matching.sort_by(|a, b| {
            b.boat
                .created_at
                .cmp(&a.boat.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(matching.into_iter().map(|stored| stored.boat.clone()).collect())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Boat>, RepositoryError> {
        Ok(self.boats.read().get(id).map(|stored| stored.boat.clone()))
    }

    fn create(&self, fields: BoatFields) -> Result<Boat, RepositoryError> {
        let now = self.clock.now();
        let boat = Boat {
            id: Uuid::new_v4().to_string(),
            name: fields.name,
            boat_type: fields.boat_type,
            year: fields.year,
            length: fields.length,
            capacity: fields.capacity,
            price: fields.price,
            is_available: fields.is_available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.boats.write().insert(
            boat.id.clone(),
            StoredBoat {
                boat: boat.clone(),
                seq,
            },
        );

        Ok(boat)
    }

    fn update(&self, id: &str, fields: BoatFields) -> Result<Boat, RepositoryError> {
        let mut boats = self.boats.write();
        let stored = boats
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let boat = &mut stored.boat;
        boat.name = fields.name;
        boat.boat_type = fields.boat_type;
        boat.year = fields.year;
        boat.length = fields.length;
        boat.capacity = fields.capacity;
        boat.price = fields.price;
        if let Some(available) = fields.is_available {
            boat.is_available = available;
        }
        boat.updated_at = self.clock.now();

        Ok(boat.clone())
    }

    fn delete(&self, id: &str) -> Result<Boat, RepositoryError> {
        self.boats
            .write()
            .remove(id)
            .map(|stored| stored.boat)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}
