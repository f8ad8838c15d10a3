//! Boat records, request bodies and list filters

use crate::cache_aside::QueryKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored boat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boat {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub boat_type: String,
    pub year: i32,
    pub length: Option<f64>,
    pub capacity: Option<u32>,
    pub price: Option<f64>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update request body, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub boat_type: Option<String>,
    pub year: Option<i32>,
    pub length: Option<f64>,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    pub is_available: Option<bool>,
}

/// Validated fields for a create or a full update
///
/// On update, `length`, `capacity` and `price` replace the stored values
/// (absent clears them) while an absent `is_available` keeps the stored flag.
#[derive(Debug, Clone, PartialEq)]
pub struct BoatFields {
    pub name: String,
    pub boat_type: String,
    pub year: i32,
    pub length: Option<f64>,
    pub capacity: Option<u32>,
    pub price: Option<f64>,
    pub is_available: Option<bool>,
}

/// Raw list query parameters as received
pub type QueryParams = BTreeMap<String, String>;

/// Validated list filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoatFilter {
    pub boat_type: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub is_available: Option<bool>,
}

impl BoatFilter {
    pub fn is_empty(&self) -> bool {
        *self == BoatFilter::default()
    }

    /// Whether `boat` satisfies every present condition
    ///
    /// A price bound excludes boats without a price.
    pub fn matches(&self, boat: &Boat) -> bool {
        if self.boat_type.as_ref().is_some_and(|t| *t != boat.boat_type) {
            return false;
        }
        if self.is_available.is_some_and(|a| a != boat.is_available) {
            return false;
        }
        if self.min_year.is_some_and(|min| boat.year < min) {
            return false;
        }
        if self.max_year.is_some_and(|max| boat.year > max) {
            return false;
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let Some(price) = boat.price else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min) {
                return false;
            }
            if self.max_price.is_some_and(|max| price > max) {
                return false;
            }
        }
        true
    }
}

impl QueryKey for BoatFilter {
    /// `field=value` pairs in field-name order joined by `&`, or `all`
    fn canonical_key(&self) -> String {
        // Pushed in alphabetical order of the field names
        let mut pairs: Vec<String> = Vec::new();
        if let Some(available) = self.is_available {
            pairs.push(format!("isAvailable={}", available));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(format!("maxPrice={}", max_price));
        }
        if let Some(max_year) = self.max_year {
            pairs.push(format!("maxYear={}", max_year));
        }
        if let Some(min_price) = self.min_price {
            pairs.push(format!("minPrice={}", min_price));
        }
        if let Some(min_year) = self.min_year {
            pairs.push(format!("minYear={}", min_year));
        }
        if let Some(boat_type) = &self.boat_type {
            pairs.push(format!("type={}", escape(boat_type)));
        }

        if pairs.is_empty() {
            "all".to_string()
        } else {
            pairs.join("&")
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_aside::list_key;

    fn boat(boat_type: &str, year: i32, price: Option<f64>, is_available: bool) -> Boat {
        let now = Utc::now();
        Boat {
            id: "b1".to_string(),
            name: "Test".to_string(),
            boat_type: boat_type.to_string(),
            year,
            length: None,
            capacity: None,
            price,
            is_available,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_boat_serializes_camel_case() {
        let json = serde_json::to_value(boat("Sailboat", 2020, Some(1.0), true)).unwrap();
        assert_eq!(json["type"], "Sailboat");
        assert_eq!(json["isAvailable"], true);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_filter_matching() {
        let filter = BoatFilter {
            boat_type: Some("Sailboat".to_string()),
            min_year: Some(2000),
            max_price: Some(200_000.0),
            ..Default::default()
        };

        assert!(filter.matches(&boat("Sailboat", 2010, Some(150_000.0), true)));
        assert!(!filter.matches(&boat("Yacht", 2010, Some(150_000.0), true)));
        assert!(!filter.matches(&boat("Sailboat", 1999, Some(150_000.0), true)));
        assert!(!filter.matches(&boat("Sailboat", 2010, None, true)));
        assert!(BoatFilter::default().matches(&boat("Yacht", 1950, None, false)));
    }

    #[test]
    fn test_canonical_key_is_order_independent() {
        let filter = BoatFilter {
            boat_type: Some("Sailboat".to_string()),
            min_year: Some(2000),
            is_available: Some(true),
            ..Default::default()
        };

        assert_eq!(
            list_key(&filter),
            "list:isAvailable=true&minYear=2000&type=Sailboat"
        );
        assert_eq!(list_key(&BoatFilter::default()), "list:all");
    }

    #[test]
    fn test_canonical_key_escapes_separators() {
        let filter = BoatFilter {
            boat_type: Some("a&minYear=1".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.canonical_key(), "type=a%26minYear%3D1");
    }
}
