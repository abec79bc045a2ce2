use chrono::NaiveDate;
use serde::Deserialize;

use super::DateRange;

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Raw `/cars/search` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSearchQuery {
    pub query: Option<String>,
    pub category: Option<i64>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub passengers: Option<i64>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub min_rating: Option<f64>,
    pub host_id: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Conjunctive car filter. Only available cars ever match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarSearch {
    pub text: Option<String>,
    pub category_id: Option<i64>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_passengers: Option<i64>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub min_rating: Option<f64>,
    pub host_id: Option<i64>,
    /// Cars with a blocking booking overlapping this range are excluded.
    pub free_during: Option<DateRange>,
}

impl CarSearch {
    pub fn from_query(query: &CarSearchQuery) -> Result<Self, String> {
        let free_during = match (query.start_date, query.end_date) {
            (Some(start), Some(end)) => {
                let range = DateRange::new(start, end)
                    .ok_or_else(|| "startDate must be before endDate".to_string())?;
                if !range.is_storable() {
                    return Err("dates must fall within years 0000 to 9999".to_string());
                }
                Some(range)
            }
            (None, None) => None,
            _ => return Err("startDate and endDate must be supplied together".to_string()),
        };

        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err("minPrice must not exceed maxPrice".to_string());
            }
        }

        Ok(Self {
            text: non_empty(&query.query),
            category_id: query.category,
            location: non_empty(&query.location),
            min_price: query.min_price,
            max_price: query.max_price,
            min_passengers: query.passengers,
            transmission: non_empty(&query.transmission),
            fuel_type: non_empty(&query.fuel_type),
            min_rating: query.min_rating,
            host_id: query.host_id,
            free_during,
        })
    }
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
