//! List-query shapes shared by the server and its clients.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::{Governorate, PropertyPurpose, PropertyTypeName};
use crate::error::ValidationErrors;

/// Forward pagination request. `cursor` is opaque to everybody but the
/// pagination engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub cursor: Option<String>,
    pub page_size: i64,
}

/// Conjunctive list filters; every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilters {
    pub title: Option<String>,
    pub property_types: Vec<PropertyTypeName>,
    pub purpose: Option<PropertyPurpose>,
    pub governorates: Vec<Governorate>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Decoded `key=value` pairs of a query string. Repeated keys and the
/// `key[]=value` form both accumulate.
#[derive(Debug, Clone, Default)]
pub struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| {
                let key: String = k.into();
                let key = key.strip_suffix("[]").map(str::to_owned).unwrap_or(key);
                (key, v.into())
            })
            .collect();
        QueryPairs { pairs }
    }

    /// Last non-blank value for `key`.
    pub fn last(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
            .next()
    }

    /// All non-blank values for `key`, in order.
    pub fn all(&self, key: &str) -> impl Iterator<Item = &str> {
        let key = key.to_owned();
        self.pairs
            .iter()
            .filter(move |(k, v)| *k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    }
}

impl PageRequest {
    /// Reads `cursor` and `pageSize` (required, `0..=max_page_size`).
    pub fn from_query(query: &QueryPairs, max_page_size: i64) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page_size = match query.last("pageSize").map(str::parse::<i64>) {
            None => {
                errors.push("pageSize", "Page size is required");
                0
            }
            Some(Err(_)) => {
                errors.push("pageSize", "Page size must be a number");
                0
            }
            Some(Ok(n)) if n < 0 => {
                errors.push("pageSize", "Page size must be positive");
                0
            }
            Some(Ok(n)) if n > max_page_size => {
                errors.push("pageSize", format!("Page size must be at most {max_page_size}"));
                0
            }
            Some(Ok(n)) => n,
        };
        errors.into_result(PageRequest {
            cursor: query.last("cursor").map(str::to_owned),
            page_size,
        })
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("pageSize".to_owned(), self.page_size.to_string())];
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor".to_owned(), cursor.clone()));
        }
        pairs
    }
}

fn choices<E: FromStr>(query: &QueryPairs, key: &str, message: &str, errors: &mut ValidationErrors) -> Vec<E> {
    let mut out = Vec::new();
    for (i, raw) in query.all(key).enumerate() {
        match raw.parse::<E>() {
            Ok(value) => out.push(value),
            Err(_) => errors.push(format!("{key}.{i}"), message),
        }
    }
    out
}

fn price(query: &QueryPairs, key: &str, label: &str, errors: &mut ValidationErrors) -> Option<f64> {
    match query.last(key).map(str::parse::<f64>) {
        None => None,
        Some(Ok(n)) if n.is_finite() && n > 0.0 => Some(n),
        Some(Ok(_)) => {
            errors.push(key, format!("{label} must be positive"));
            None
        }
        Some(Err(_)) => {
            errors.push(key, format!("{label} must be a number"));
            None
        }
    }
}

impl PropertyFilters {
    pub fn from_query(query: &QueryPairs) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let property_types = choices(query, "propertyTypes", PropertyTypeName::INVALID_MESSAGE, &mut errors);
        let governorates = choices(query, "governorates", Governorate::INVALID_MESSAGE, &mut errors);
        let purpose = match query.last("purpose").map(str::parse::<PropertyPurpose>) {
            None => None,
            Some(Ok(purpose)) => Some(purpose),
            Some(Err(_)) => {
                errors.push("purpose", PropertyPurpose::INVALID_MESSAGE);
                None
            }
        };
        let min_price = price(query, "minPrice", "Min price", &mut errors);
        let max_price = price(query, "maxPrice", "Max price", &mut errors);
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if max < min {
                errors.push("maxPrice", "Max price must not be less than min price");
            }
        }
        errors.into_result(PropertyFilters {
            title: query.last("title").map(str::to_owned),
            property_types,
            purpose,
            governorates,
            city: query.last("city").map(str::to_owned),
            min_price,
            max_price,
        })
    }

    /// Query pairs a client sends for these filters.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(title) = &self.title {
            pairs.push(("title".to_owned(), title.clone()));
        }
        for kind in &self.property_types {
            pairs.push(("propertyTypes".to_owned(), kind.to_string()));
        }
        if let Some(purpose) = self.purpose {
            pairs.push(("purpose".to_owned(), purpose.to_string()));
        }
        for governorate in &self.governorates {
            pairs.push(("governorates".to_owned(), governorate.to_string()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city".to_owned(), city.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice".to_owned(), min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice".to_owned(), max.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_required_and_bounded() {
        let missing = PageRequest::from_query(&QueryPairs::new([("cursor", "MQ==")]), 100).unwrap_err();
        assert_eq!(missing.paths().collect::<Vec<_>>(), vec!["pageSize"]);

        let too_big = PageRequest::from_query(&QueryPairs::new([("pageSize", "101")]), 100).unwrap_err();
        assert!(too_big.touches("pageSize"));

        let zero = PageRequest::from_query(&QueryPairs::new([("pageSize", "0")]), 100).unwrap();
        assert_eq!(zero.page_size, 0);
        assert_eq!(zero.cursor, None);
    }

    #[test]
    fn repeated_and_bracketed_keys_accumulate() {
        let query = QueryPairs::new([
            ("propertyTypes[]", "VILLA"),
            ("propertyTypes[]", "LAND"),
            ("governorates", "GIZA"),
            ("title", " "),
        ]);
        let filters = PropertyFilters::from_query(&query).unwrap();
        assert_eq!(
            filters.property_types,
            vec![PropertyTypeName::Villa, PropertyTypeName::Land]
        );
        assert_eq!(filters.governorates, vec![Governorate::Giza]);
        assert_eq!(filters.title, None);
    }

    #[test]
    fn bad_filters_are_reported_by_field() {
        let query = QueryPairs::new([
            ("propertyTypes", "VILLA"),
            ("propertyTypes", "CASTLE"),
            ("purpose", "LEASE"),
            ("minPrice", "500"),
            ("maxPrice", "100"),
        ]);
        let errors = PropertyFilters::from_query(&query).unwrap_err();
        assert_eq!(
            errors.paths().collect::<Vec<_>>(),
            vec!["propertyTypes.1", "purpose", "maxPrice"]
        );
    }

    #[test]
    fn filters_survive_query_round_trip() {
        let filters = PropertyFilters {
            title: Some("garden".into()),
            property_types: vec![PropertyTypeName::Apartment],
            purpose: Some(PropertyPurpose::Rent),
            governorates: vec![Governorate::Alexandria, Governorate::Cairo],
            city: Some("Smouha".into()),
            min_price: Some(1000.0),
            max_price: Some(25000.5),
        };
        let parsed = PropertyFilters::from_query(&QueryPairs::new(filters.to_pairs())).unwrap();
        assert_eq!(parsed, filters);
    }
}
