use std::sync::Arc;

use axum::extract::multipart::Multipart;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use super::{check_auth, json_body, read_uploads, ListQuery};
use crate::errors::AppError;
use crate::models::{Asset, BookingDetails, NewUser, Paginated, ProfilePatch, User, UserProfile};
use crate::services::profile;
use crate::state::AppState;

// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let user = json_body(body)?;

    let conn = state.conn()?;
    Ok(Json(profile::create_user(&*conn, &user)?))
}

// GET /api/users/:user_id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let conn = state.conn()?;
    Ok(Json(profile::get_user(&*conn, user_id)?))
}

// GET /api/users/:user_id/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, AppError> {
    let conn = state.conn()?;
    Ok(Json(profile::get_profile(&*conn, user_id)?))
}

// PUT /api/users/:user_id/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    body: Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let patch = json_body(body)?;

    let conn = state.conn()?;
    Ok(Json(profile::update_profile(&*conn, user_id, patch)?))
}

// POST /api/users/:user_id/profile-picture
pub async fn upload_profile_picture(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Asset>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let files = read_uploads(multipart).await?;

    let asset =
        profile::upload_profile_picture(&*state.db, state.blobs.as_ref(), user_id, files).await?;
    Ok(Json(asset))
}

// GET /api/users/:user_id/bookings
pub async fn booking_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<BookingDetails>>, AppError> {
    let page = query.page_request(state.config.max_page_size)?;

    let conn = state.conn()?;
    Ok(Json(profile::booking_history(&*conn, user_id, page)?))
}
