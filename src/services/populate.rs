use crate::models::{Booking, BookingDetails, Car, CarDetails, UserSummary};
use crate::repository::{AssetRepository, CarRepository, CategoryRepository, UserRepository};

pub fn user_summary<S>(store: &S, user_id: i64) -> anyhow::Result<Option<UserSummary>>
where
    S: UserRepository + AssetRepository,
{
    let Some(user) = store.find_user(user_id)? else {
        return Ok(None);
    };
    let profile_image = match user.profile_image_id {
        Some(asset_id) => store.find_asset(asset_id)?,
        None => None,
    };
    Ok(Some(UserSummary {
        id: user.id,
        name: user.name,
        email: user.email,
        profile_image,
    }))
}

pub fn car_details<S>(store: &S, car: Car) -> anyhow::Result<CarDetails>
where
    S: CategoryRepository + AssetRepository + UserRepository,
{
    let category = match car.category_id {
        Some(id) => store.find_category(id)?,
        None => None,
    };
    let images = store.assets_for_car(car.id)?;
    let host = user_summary(store, car.host_id)?;
    Ok(CarDetails {
        car,
        category,
        images,
        host,
    })
}

pub fn booking_details<S>(store: &S, booking: Booking) -> anyhow::Result<BookingDetails>
where
    S: CarRepository + CategoryRepository + AssetRepository + UserRepository,
{
    let car = match store.find_car(booking.car_id)? {
        Some(car) => Some(car_details(store, car)?),
        None => None,
    };
    let user = user_summary(store, booking.user_id)?;
    Ok(BookingDetails { booking, car, user })
}
