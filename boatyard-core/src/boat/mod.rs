//! Boat records and their source of truth

pub mod model;
pub mod repository;
pub mod validation;

pub use model::{Boat, BoatFields, BoatFilter, BoatInput, QueryParams};
pub use repository::{BoatRepository, InMemoryBoatRepository};
pub use validation::{parse_filter, validate_input, MIN_YEAR};
