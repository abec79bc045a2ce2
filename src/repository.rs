use std::sync::{Mutex, MutexGuard};

use crate::errors::AppError;
use crate::models::{
    Asset, Booking, BookingFilter, BookingStatus, Car, CarSearch, Category, CategoryWithCount,
    NewAsset, NewBooking, NewCar, NewUser, PageRequest, ProfilePatch, User,
};

pub trait BookingRepository {
    fn insert_booking(&self, booking: &NewBooking) -> anyhow::Result<Booking>;
    fn find_booking(&self, id: i64) -> anyhow::Result<Option<Booking>>;
    fn blocking_bookings_for_car(&self, car_id: i64) -> anyhow::Result<Vec<Booking>>;
    fn update_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> anyhow::Result<Option<Booking>>;
    fn list_bookings(&self, filter: &BookingFilter, page: PageRequest)
        -> anyhow::Result<Vec<Booking>>;
    fn count_bookings(&self, filter: &BookingFilter) -> anyhow::Result<u64>;
    fn bookings_for_host(&self, host_id: i64) -> anyhow::Result<Vec<Booking>>;
    fn bookings_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Booking>>;
}

pub trait CarRepository {
    fn insert_car(&self, car: &NewCar) -> anyhow::Result<Car>;
    fn find_car(&self, id: i64) -> anyhow::Result<Option<Car>>;
    fn search_cars(&self, search: &CarSearch, limit: i64, offset: i64) -> anyhow::Result<Vec<Car>>;
    fn count_cars(&self, search: &CarSearch) -> anyhow::Result<u64>;
    fn cars_for_host(&self, host_id: i64, page: Option<PageRequest>) -> anyhow::Result<Vec<Car>>;
    fn count_cars_for_host(&self, host_id: i64) -> anyhow::Result<u64>;
    fn available_locations(&self, limit: i64) -> anyhow::Result<Vec<String>>;
}

pub trait CategoryRepository {
    fn insert_category(&self, name: &str) -> anyhow::Result<Category>;
    fn find_category(&self, id: i64) -> anyhow::Result<Option<Category>>;
    fn categories_with_count(&self) -> anyhow::Result<Vec<CategoryWithCount>>;
}

pub trait UserRepository {
    fn insert_user(&self, user: &NewUser) -> anyhow::Result<User>;
    fn find_user(&self, id: i64) -> anyhow::Result<Option<User>>;
    fn update_profile(&self, id: i64, patch: &ProfilePatch) -> anyhow::Result<Option<User>>;
    fn set_profile_image(&self, user_id: i64, asset_id: i64) -> anyhow::Result<bool>;
}

pub trait AssetRepository {
    fn insert_asset(&self, asset: &NewAsset) -> anyhow::Result<Asset>;
    fn find_asset(&self, id: i64) -> anyhow::Result<Option<Asset>>;
    fn assets_for_car(&self, car_id: i64) -> anyhow::Result<Vec<Asset>>;
    fn delete_asset(&self, id: i64) -> anyhow::Result<bool>;
}

// An `Err` from `f` rolls the work back.
pub trait Atomic {
    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&Self) -> Result<T, AppError>,
    ) -> Result<T, AppError>;
}

pub trait Store:
    BookingRepository + CarRepository + CategoryRepository + UserRepository + AssetRepository + Atomic
{
}

impl<S> Store for S where
    S: BookingRepository
        + CarRepository
        + CategoryRepository
        + UserRepository
        + AssetRepository
        + Atomic
{
}

pub fn lock<S>(db: &Mutex<S>) -> Result<MutexGuard<'_, S>, AppError> {
    db.lock()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("database connection lock poisoned")))
}
