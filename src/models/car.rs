use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Asset, Category, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub host_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price_per_day: f64,
    pub is_available: bool,
    pub location: String,
    pub passengers: i64,
    pub transmission: String,
    pub fuel_type: String,
    pub rating: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCar {
    pub host_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_per_day: f64,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub passengers: i64,
    #[serde(default)]
    pub transmission: String,
    #[serde(default)]
    pub fuel_type: String,
    #[serde(default)]
    pub rating: f64,
}

fn default_available() -> bool {
    true
}

/// A car with its category, images and host populated.
#[derive(Debug, Clone, Serialize)]
pub struct CarDetails {
    #[serde(flatten)]
    pub car: Car,
    pub category: Option<Category>,
    pub images: Vec<Asset>,
    pub host: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarHostStats {
    pub total_cars: u64,
    pub available_cars: u64,
    pub total_bookings: u64,
    pub active_bookings: u64,
    pub total_revenue: f64,
    pub average_rating: f64,
}
