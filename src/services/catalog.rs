use std::sync::Mutex;

use crate::errors::AppError;
use crate::models::{
    Asset, BookingStatus, Car, CarDetails, CarHostStats, CarSearch, CarSearchQuery, NewAsset,
    NewCar, PageRequest, Paginated,
};
use crate::models::search::DEFAULT_SEARCH_LIMIT;
use crate::repository::{self, AssetRepository, CarRepository, Store};
use crate::services::populate;
use crate::services::storage::{BlobStore, Upload};

pub const POPULAR_LOCATIONS_LIMIT: i64 = 10;

pub fn search<S: Store>(
    store: &S,
    query: &CarSearchQuery,
    max_page_size: u32,
) -> Result<Paginated<CarDetails>, AppError> {
    let search = CarSearch::from_query(query).map_err(AppError::Validation)?;
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let (page, offset) = PageRequest::from_offset(query.offset.unwrap_or(0), limit, max_page_size)
        .map_err(AppError::Validation)?;

    let cars = store.search_cars(&search, page.limit(), offset as i64)?;
    let total = store.count_cars(&search)?;

    let data = cars
        .into_iter()
        .map(|car| populate::car_details(store, car))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
}

pub fn popular_locations<S: CarRepository>(store: &S) -> Result<Vec<String>, AppError> {
    Ok(store.available_locations(POPULAR_LOCATIONS_LIMIT)?)
}

pub fn host_cars<S: Store>(
    store: &S,
    host_id: i64,
    page: PageRequest,
) -> Result<Paginated<CarDetails>, AppError> {
    let cars = store.cars_for_host(host_id, Some(page))?;
    let total = store.count_cars_for_host(host_id)?;

    let data = cars
        .into_iter()
        .map(|car| populate::car_details(store, car))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
}

pub fn average_rating(ratings: &[f64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
    (mean * 100.0).round() / 100.0
}

pub fn host_stats<S: Store>(store: &S, host_id: i64) -> Result<CarHostStats, AppError> {
    let cars = store.cars_for_host(host_id, None)?;
    let bookings = store.bookings_for_host(host_id)?;

    let ratings: Vec<f64> = cars.iter().map(|c| c.rating).collect();
    Ok(CarHostStats {
        total_cars: cars.len() as u64,
        available_cars: cars.iter().filter(|c| c.is_available).count() as u64,
        total_bookings: bookings.len() as u64,
        active_bookings: bookings
            .iter()
            .filter(|b| matches!(b.status, BookingStatus::Confirmed | BookingStatus::Active))
            .count() as u64,
        total_revenue: bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .map(|b| b.total_price)
            .sum(),
        average_rating: average_rating(&ratings),
    })
}

pub fn create_car<S: Store>(store: &S, car: &NewCar) -> Result<Car, AppError> {
    if car.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if !car.price_per_day.is_finite() || car.price_per_day < 0.0 {
        return Err(AppError::validation("pricePerDay must be a non-negative number"));
    }
    if !(0.0..=5.0).contains(&car.rating) {
        return Err(AppError::validation("rating must be between 0 and 5"));
    }
    if car.passengers < 0 {
        return Err(AppError::validation("passengers must not be negative"));
    }
    store
        .find_user(car.host_id)?
        .ok_or_else(|| AppError::not_found(format!("user {}", car.host_id)))?;
    if let Some(category_id) = car.category_id {
        store
            .find_category(category_id)?
            .ok_or_else(|| AppError::not_found(format!("category {category_id}")))?;
    }

    let created = store.insert_car(car)?;
    tracing::info!(car_id = created.id, host_id = created.host_id, "car created");
    Ok(created)
}

pub fn get_car<S: Store>(store: &S, car_id: i64) -> Result<CarDetails, AppError> {
    let car = store
        .find_car(car_id)?
        .ok_or_else(|| AppError::not_found(format!("car {car_id}")))?;
    Ok(populate::car_details(store, car)?)
}

pub(crate) fn storage_error(err: anyhow::Error) -> AppError {
    AppError::Storage(format!("{err:#}"))
}

pub async fn upload_images<S>(
    db: &Mutex<S>,
    blobs: &dyn BlobStore,
    car_id: i64,
    files: Vec<Upload>,
) -> Result<Vec<Asset>, AppError>
where
    S: CarRepository + AssetRepository + Send,
{
    if files.is_empty() {
        return Err(AppError::validation("no files uploaded"));
    }
    {
        let conn = repository::lock(db)?;
        conn.find_car(car_id)?
            .ok_or_else(|| AppError::not_found(format!("car {car_id}")))?;
    }

    let mut uploaded = Vec::with_capacity(files.len());
    for file in &files {
        let blob = blobs.upload(file).await.map_err(storage_error)?;

        let attached = {
            let conn = repository::lock(db)?;
            conn.insert_asset(&NewAsset {
                storage_key: blob.key.clone(),
                url: blob.url.clone(),
                name: file.file_name.clone(),
                mime: file.content_type.clone(),
                size: blob.size,
                car_id: Some(car_id),
            })
        };

        match attached {
            Ok(asset) => uploaded.push(asset),
            Err(e) => {
                tracing::error!(car_id, key = %blob.key, error = %e, "failed to attach image, removing blob");
                if let Err(remove_err) = blobs.remove(&blob.key).await {
                    tracing::error!(key = %blob.key, error = %remove_err, "failed to remove orphaned blob");
                }
                return Err(e.into());
            }
        }
    }

    tracing::info!(car_id, count = uploaded.len(), "car images uploaded");
    Ok(uploaded)
}

pub async fn delete_image<S>(
    db: &Mutex<S>,
    blobs: &dyn BlobStore,
    car_id: i64,
    image_id: i64,
) -> Result<(), AppError>
where
    S: CarRepository + AssetRepository + Send,
{
    let asset = {
        let conn = repository::lock(db)?;
        conn.find_car(car_id)?
            .ok_or_else(|| AppError::not_found(format!("car {car_id}")))?;
        let asset = conn
            .find_asset(image_id)?
            .filter(|a| a.car_id == Some(car_id))
            .ok_or_else(|| AppError::not_found(format!("image {image_id}")))?;
        conn.delete_asset(asset.id)?;
        asset
    };

    blobs.remove(&asset.storage_key).await.map_err(|e| {
        tracing::error!(car_id, image_id, key = %asset.storage_key, error = %e, "image record deleted but blob removal failed");
        storage_error(e)
    })?;

    tracing::info!(car_id, image_id, "car image deleted");
    Ok(())
}
