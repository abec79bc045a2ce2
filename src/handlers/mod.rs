pub mod bookings;
pub mod cars;
pub mod categories;
pub mod health;
pub mod users;

use std::sync::Arc;

use axum::extract::multipart::Multipart;
use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::models::{BookingStatus, PageQuery, PageRequest};
use crate::services::booking::parse_status;
use crate::services::storage::Upload;
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let upload_path = state.config.public_upload_path.clone();

    Router::new()
        .route("/health", get(health::health))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/:booking_id", get(bookings::get_booking))
        .route(
            "/api/bookings/:booking_id/status",
            put(bookings::update_status),
        )
        .route("/api/bookings/host/:host_id", get(bookings::host_bookings))
        .route(
            "/api/bookings/host/:host_id/stats",
            get(bookings::host_booking_stats),
        )
        .route("/api/bookings/user/:user_id", get(bookings::user_bookings))
        .route("/api/cars", post(cars::create_car))
        .route("/api/cars/search", get(cars::search))
        .route("/api/cars/popular-locations", get(cars::popular_locations))
        .route("/api/cars/host/:host_id", get(cars::host_cars))
        .route("/api/cars/host/:host_id/stats", get(cars::host_stats))
        .route("/api/cars/:car_id", get(cars::get_car))
        .route(
            "/api/cars/:car_id/images",
            post(cars::upload_images).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/cars/:car_id/images/:image_id",
            axum::routing::delete(cars::delete_image),
        )
        .route("/api/categories", post(categories::create_category))
        .route("/api/categories/with-count", get(categories::with_count))
        .route("/api/categories/popular", get(categories::popular))
        .route("/api/categories/:category_id", get(categories::get_category))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:user_id", get(users::get_user))
        .route(
            "/api/users/:user_id/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route(
            "/api/users/:user_id/profile-picture",
            post(users::upload_profile_picture).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/users/:user_id/bookings", get(users::booking_history))
        .nest_service(&upload_path, uploads)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Mutating routes require `Authorization: Bearer <API_TOKEN>` when a token
/// is configured.
pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    if expected_token.is_empty() {
        return Ok(());
    }

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Turns extractor failures into 400s with the extractor's message.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

// ?page=&pageSize=&status=
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self, max_page_size: u32) -> Result<PageRequest, AppError> {
        let query = PageQuery {
            page: self.page,
            page_size: self.page_size,
        };
        PageRequest::from_query(&query, max_page_size).map_err(AppError::Validation)
    }

    pub fn status(&self) -> Result<Option<BookingStatus>, AppError> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_status)
            .transpose()
    }
}

/// Reads every file part of a multipart body.
pub(crate) async fn read_uploads(mut multipart: Multipart) -> Result<Vec<Upload>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("failed to read upload: {e}")))?;
        files.push(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Ok(files)
}
