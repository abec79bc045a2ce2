use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::{check_auth, json_body, ListQuery};
use crate::errors::AppError;
use crate::models::{Booking, BookingDetails, BookingStats, Paginated};
use crate::services::booking::{self, CreateBookingRequest};
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let req = json_body(body)?;

    let mut conn = state.conn()?;
    let booking = booking::create_booking(&mut *conn, &req)?;
    Ok(Json(booking))
}

// GET /api/bookings/:booking_id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let conn = state.conn()?;
    Ok(Json(booking::get_booking(&*conn, booking_id)?))
}

// PUT /api/bookings/:booking_id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<i64>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let req = json_body(body)?;

    let mut conn = state.conn()?;
    let booking = booking::update_status(&mut *conn, booking_id, &req.status)?;
    Ok(Json(booking))
}

// GET /api/bookings/host/:host_id
pub async fn host_bookings(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<BookingDetails>>, AppError> {
    let page = query.page_request(state.config.max_page_size)?;
    let status = query.status()?;

    let conn = state.conn()?;
    Ok(Json(booking::list_for_host(&*conn, host_id, page, status)?))
}

// GET /api/bookings/host/:host_id/stats
pub async fn host_booking_stats(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<i64>,
) -> Result<Json<BookingStats>, AppError> {
    let conn = state.conn()?;
    Ok(Json(booking::compute_host_stats(&*conn, host_id)?))
}

// GET /api/bookings/user/:user_id
pub async fn user_bookings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<BookingDetails>>, AppError> {
    let page = query.page_request(state.config.max_page_size)?;
    let status = query.status()?;

    let conn = state.conn()?;
    Ok(Json(booking::list_for_user(&*conn, user_id, page, status)?))
}
