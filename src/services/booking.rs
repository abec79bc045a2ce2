use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{
    Booking, BookingDetails, BookingFilter, BookingScope, BookingStats, BookingStatus, DateRange,
    NewBooking, PageRequest, Paginated,
};
use crate::repository::{Atomic, BookingRepository, CarRepository, Store, UserRepository};
use crate::services::populate;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub car_id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: f64,
    pub notes: Option<String>,
}

pub fn find_conflict<'a>(existing: &'a [Booking], range: &DateRange) -> Option<&'a Booking> {
    existing
        .iter()
        .find(|b| b.status.is_blocking() && b.range().overlaps(range))
}

pub fn parse_status(raw: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(raw).ok_or_else(|| AppError::validation(format!("invalid status: {raw}")))
}

pub fn create_booking<S>(store: &mut S, req: &CreateBookingRequest) -> Result<Booking, AppError>
where
    S: BookingRepository + CarRepository + UserRepository + Atomic,
{
    let range = DateRange::new(req.start_date, req.end_date)
        .ok_or_else(|| AppError::validation("startDate must be before endDate"))?;
    if !range.is_storable() {
        return Err(AppError::validation("dates must fall within years 0000 to 9999"));
    }
    if !req.total_price.is_finite() || req.total_price < 0.0 {
        return Err(AppError::validation("totalPrice must be a non-negative number"));
    }

    // Conflict check and insert share one transaction.
    let booking = store.atomically(|store| {
        let car = store
            .find_car(req.car_id)?
            .ok_or_else(|| AppError::not_found(format!("car {}", req.car_id)))?;
        store
            .find_user(req.user_id)?
            .ok_or_else(|| AppError::not_found(format!("user {}", req.user_id)))?;

        let existing = store.blocking_bookings_for_car(car.id)?;
        if let Some(conflict) = find_conflict(&existing, &range) {
            return Err(AppError::conflict(format!(
                "car {} is already booked from {} to {} (booking {})",
                car.id, conflict.start_date, conflict.end_date, conflict.id
            )));
        }

        let booking = store.insert_booking(&NewBooking {
            car_id: car.id,
            user_id: req.user_id,
            host_id: car.host_id,
            range,
            total_price: req.total_price,
            notes: req.notes.clone(),
        })?;
        Ok(booking)
    })?;

    tracing::info!(
        booking_id = booking.id,
        car_id = booking.car_id,
        user_id = booking.user_id,
        "booking created"
    );
    Ok(booking)
}

pub fn update_status<S>(store: &mut S, booking_id: i64, raw_status: &str) -> Result<Booking, AppError>
where
    S: BookingRepository + Atomic,
{
    let next = parse_status(raw_status)?;

    let (previous, booking) = store.atomically(|store| {
        let booking = store
            .find_booking(booking_id)?
            .ok_or_else(|| AppError::not_found(format!("booking {booking_id}")))?;

        if !booking.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "cannot move booking from {} to {next}",
                booking.status
            )));
        }

        let updated = store
            .update_booking_status(booking_id, next)?
            .ok_or_else(|| AppError::not_found(format!("booking {booking_id}")))?;
        Ok((booking.status, updated))
    })?;

    tracing::info!(booking_id, from = %previous, to = %next, "booking status changed");
    Ok(booking)
}

pub fn get_booking<S: BookingRepository>(store: &S, booking_id: i64) -> Result<Booking, AppError> {
    store
        .find_booking(booking_id)?
        .ok_or_else(|| AppError::not_found(format!("booking {booking_id}")))
}

pub fn list_bookings<S: Store>(
    store: &S,
    filter: &BookingFilter,
    page: PageRequest,
) -> Result<Paginated<BookingDetails>, AppError> {
    let bookings = store.list_bookings(filter, page)?;
    let total = store.count_bookings(filter)?;

    let data = bookings
        .into_iter()
        .map(|b| populate::booking_details(store, b))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
}

pub fn list_for_host<S: Store>(
    store: &S,
    host_id: i64,
    page: PageRequest,
    status: Option<BookingStatus>,
) -> Result<Paginated<BookingDetails>, AppError> {
    let filter = BookingFilter {
        scope: BookingScope::Host(host_id),
        status,
    };
    list_bookings(store, &filter, page)
}

pub fn list_for_user<S: Store>(
    store: &S,
    user_id: i64,
    page: PageRequest,
    status: Option<BookingStatus>,
) -> Result<Paginated<BookingDetails>, AppError> {
    let filter = BookingFilter {
        scope: BookingScope::User(user_id),
        status,
    };
    list_bookings(store, &filter, page)
}

pub fn compute_host_stats<S: BookingRepository>(
    store: &S,
    host_id: i64,
) -> Result<BookingStats, AppError> {
    let bookings = store.bookings_for_host(host_id)?;
    Ok(bookings.iter().collect())
}
