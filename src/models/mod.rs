pub mod asset;
pub mod booking;
pub mod car;
pub mod category;
pub mod pagination;
pub mod search;
pub mod user;

pub use asset::{Asset, NewAsset};
pub use booking::{
    Booking, BookingDetails, BookingFilter, BookingScope, BookingStats, BookingStatus, DateRange,
    NewBooking,
};
pub use car::{Car, CarDetails, CarHostStats, NewCar};
pub use category::{Category, CategoryWithCount};
pub use pagination::{PageQuery, PageRequest, Paginated, Pagination};
pub use search::{CarSearch, CarSearchQuery};
pub use user::{NewUser, ProfilePatch, User, UserProfile, UserSummary};
