//! Input and filter validation
//!
//! Every rule is checked and all failures are reported together.

use crate::boat::model::{BoatFields, BoatFilter, BoatInput, QueryParams};
use crate::error::ValidationErrors;

/// Oldest accepted build year
pub const MIN_YEAR: i32 = 1900;

/// Maximum passengers per metre of length
const MAX_CAPACITY_PER_METRE: f64 = 3.0;

/// Validate a create/update body against the year bound `current_year + 1`
pub fn validate_input(input: &BoatInput, current_year: i32) -> Result<BoatFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let max_year = current_year + 1;

    let name = input.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let boat_type = input.boat_type.as_deref().map(str::trim).filter(|t| !t.is_empty());

    if name.is_none() {
        errors.push("Boat name is required");
    }
    if boat_type.is_none() {
        errors.push("Boat type is required");
    }
    match input.year {
        None => errors.push("Boat year is required"),
        Some(year) if !(MIN_YEAR..=max_year).contains(&year) => {
            errors.push(format!("Year must be a number between {} and {}", MIN_YEAR, max_year));
        }
        Some(_) => {}
    }

    if input.length.is_some_and(|l| !l.is_finite() || l <= 0.0) {
        errors.push("Length must be a positive number");
    }
    if input.capacity.is_some_and(|c| c <= 0 || c > i64::from(u32::MAX)) {
        errors.push("Capacity must be a positive integer");
    }
    if input.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        errors.push("Price must be zero or a positive number");
    }
    if let (Some(capacity), Some(length)) = (input.capacity, input.length) {
        if capacity > 0 && length > 0.0 && capacity as f64 > length * MAX_CAPACITY_PER_METRE {
            errors.push("Capacity seems too high for the boat's length");
        }
    }

    errors.into_result(BoatFields {
        name: name.unwrap_or_default().to_string(),
        boat_type: boat_type.unwrap_or_default().to_string(),
        year: input.year.unwrap_or_default(),
        length: input.length,
        capacity: input.capacity.and_then(|c| u32::try_from(c).ok()),
        price: input.price,
        is_available: input.is_available,
    })
}

/// Parse and validate list query parameters into a filter
///
/// Unknown parameters are ignored. `isAvailable` is true only for the
/// literal `true`.
pub fn parse_filter(params: &QueryParams, current_year: i32) -> Result<BoatFilter, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let max_year = current_year + 1;

    let min_year = parse_param::<i32>(params, "minYear");
    let max_year_param = parse_param::<i32>(params, "maxYear");
    let min_price = parse_param::<f64>(params, "minPrice");
    let max_price = parse_param::<f64>(params, "maxPrice");

    match min_year {
        Some(Some(y)) if y >= MIN_YEAR => {}
        Some(_) => errors.push(format!("minYear must be a number greater than or equal to {}", MIN_YEAR)),
        None => {}
    }
    match max_year_param {
        Some(Some(y)) if y <= max_year => {}
        Some(_) => errors.push(format!("maxYear must be a number less than or equal to {}", max_year)),
        None => {}
    }
    if let (Some(Some(min)), Some(Some(max))) = (min_year, max_year_param) {
        if min > max {
            errors.push("minYear cannot be greater than maxYear");
        }
    }

    match min_price {
        Some(Some(p)) if p.is_finite() && p >= 0.0 => {}
        Some(_) => errors.push("minPrice must be zero or a positive number"),
        None => {}
    }
    match max_price {
        Some(Some(p)) if p.is_finite() && p >= 0.0 => {}
        Some(_) => errors.push("maxPrice must be zero or a positive number"),
        None => {}
    }
    if let (Some(Some(min)), Some(Some(max))) = (min_price, max_price) {
        if min > max {
            errors.push("minPrice cannot be greater than maxPrice");
        }
    }

    let filter = BoatFilter {
        boat_type: non_empty(params, "type").map(str::to_string),
        min_year: min_year.flatten(),
        max_year: max_year_param.flatten(),
        min_price: min_price.flatten(),
        max_price: max_price.flatten(),
        is_available: params.get("isAvailable").map(|v| v == "true"),
    };

    errors.into_result(filter)
}

fn non_empty<'a>(params: &'a QueryParams, name: &str) -> Option<&'a str> {
    params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// None when the parameter is absent or blank, Some(None) when it does not parse
fn parse_param<T: std::str::FromStr>(params: &QueryParams, name: &str) -> Option<Option<T>> {
    non_empty(params, name).map(|raw| raw.parse().ok())
}
