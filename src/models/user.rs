use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Asset, BookingDetails, CarDetails};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_image_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

/// Partial profile update. Absent or empty fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

impl ProfilePatch {
    /// Drops empty strings so they count as "not supplied".
    pub fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }
        Self {
            name: keep(self.name),
            email: keep(self.email),
            phone: keep(self.phone),
            bio: keep(self.bio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.bio.is_none()
    }
}

/// The public fields other users may see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub profile_image: Option<Asset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub profile_image: Option<Asset>,
    pub cars: Vec<CarDetails>,
    pub bookings: Vec<BookingDetails>,
}
