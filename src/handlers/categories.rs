use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::{check_auth, json_body};
use crate::errors::AppError;
use crate::models::{Category, CategoryWithCount};
use crate::services::category;
use crate::state::AppState;

// POST /api/categories
#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<Json<Category>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let req = json_body(body)?;

    let conn = state.conn()?;
    Ok(Json(category::create(&*conn, &req.name)?))
}

// GET /api/categories/:category_id
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    let conn = state.conn()?;
    Ok(Json(category::get(&*conn, category_id)?))
}

// GET /api/categories/with-count
pub async fn with_count(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryWithCount>>, AppError> {
    let conn = state.conn()?;
    Ok(Json(category::with_count(&*conn)?))
}

// GET /api/categories/popular
#[derive(Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<CategoryWithCount>>, AppError> {
    let limit = query.limit.unwrap_or(category::DEFAULT_POPULAR_LIMIT);

    let conn = state.conn()?;
    Ok(Json(category::popular(&*conn, limit)?))
}
