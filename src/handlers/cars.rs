use std::sync::Arc;

use axum::extract::multipart::Multipart;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use super::{check_auth, json_body, read_uploads, ListQuery};
use crate::errors::AppError;
use crate::models::{Asset, Car, CarDetails, CarHostStats, CarSearchQuery, NewCar, Paginated};
use crate::services::catalog;
use crate::state::AppState;

// POST /api/cars
pub async fn create_car(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewCar>, JsonRejection>,
) -> Result<Json<Car>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let car = json_body(body)?;

    let conn = state.conn()?;
    Ok(Json(catalog::create_car(&*conn, &car)?))
}

// GET /api/cars/:car_id
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<i64>,
) -> Result<Json<CarDetails>, AppError> {
    let conn = state.conn()?;
    Ok(Json(catalog::get_car(&*conn, car_id)?))
}

// GET /api/cars/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CarSearchQuery>,
) -> Result<Json<Paginated<CarDetails>>, AppError> {
    let conn = state.conn()?;
    Ok(Json(catalog::search(&*conn, &query, state.config.max_page_size)?))
}

// GET /api/cars/popular-locations
pub async fn popular_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let conn = state.conn()?;
    Ok(Json(catalog::popular_locations(&*conn)?))
}

// GET /api/cars/host/:host_id
pub async fn host_cars(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<CarDetails>>, AppError> {
    let page = query.page_request(state.config.max_page_size)?;

    let conn = state.conn()?;
    Ok(Json(catalog::host_cars(&*conn, host_id, page)?))
}

// GET /api/cars/host/:host_id/stats
pub async fn host_stats(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<i64>,
) -> Result<Json<CarHostStats>, AppError> {
    let conn = state.conn()?;
    Ok(Json(catalog::host_stats(&*conn, host_id)?))
}

// POST /api/cars/:car_id/images
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(car_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Vec<Asset>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let files = read_uploads(multipart).await?;

    let images = catalog::upload_images(&*state.db, state.blobs.as_ref(), car_id, files).await?;
    Ok(Json(images))
}

// DELETE /api/cars/:car_id/images/:image_id
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((car_id, image_id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    catalog::delete_image(&*state.db, state.blobs.as_ref(), car_id, image_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
