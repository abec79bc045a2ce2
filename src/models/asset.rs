use chrono::NaiveDateTime;
use serde::Serialize;

/// An uploaded file tracked in the record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: i64,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub url: String,
    pub name: String,
    pub mime: String,
    pub size: i64,
    pub car_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub storage_key: String,
    pub url: String,
    pub name: String,
    pub mime: String,
    pub size: i64,
    pub car_id: Option<i64>,
}
