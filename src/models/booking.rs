use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{CarDetails, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub car_id: i64,
    pub user_id: i64,
    pub host_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub total_price: f64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// A booking with its car and renter populated.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub car: Option<CarDetails>,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub total_revenue: f64,
}

impl BookingStats {
    pub fn record(&mut self, booking: &Booking) {
        self.total += 1;
        match booking.status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Confirmed => self.confirmed += 1,
            BookingStatus::Active => self.active += 1,
            BookingStatus::Completed => {
                self.completed += 1;
                self.total_revenue += booking.total_price;
            }
            BookingStatus::Cancelled => self.cancelled += 1,
        }
    }
}

impl<'a> FromIterator<&'a Booking> for BookingStats {
    fn from_iter<I: IntoIterator<Item = &'a Booking>>(iter: I) -> Self {
        let mut stats = BookingStats::default();
        for booking in iter {
            stats.record(booking);
        }
        stats
    }
}

/// Whose bookings a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingScope {
    /// Bookings against cars owned by this host.
    Host(i64),
    /// Bookings made by this renter.
    User(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingFilter {
    pub scope: BookingScope,
    pub status: Option<BookingStatus>,
}

/// Fields supplied by the renter; everything else is derived on insert.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub car_id: i64,
    pub user_id: i64,
    pub host_id: i64,
    pub range: DateRange,
    pub total_price: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Active,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    /// Statuses that hold the car's calendar.
    pub const BLOCKING: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Active,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    /// Forward-only lifecycle. Same-state moves are not transitions.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Active)
                | (Confirmed, Cancelled)
                | (Active, Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Returns `None` unless `start < end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Dates are stored as `%Y-%m-%d` text and compared as strings, which
    /// only orders correctly for four-digit years.
    pub fn is_storable(&self) -> bool {
        [self.start, self.end]
            .iter()
            .all(|d| (0..=9999).contains(&d.year()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(a: &str, b: &str) -> DateRange {
        DateRange::new(d(a), d(b)).unwrap()
    }

    #[test]
    fn test_parse_known_statuses() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_wrong_case() {
        assert_eq!(BookingStatus::parse("refunded"), None);
        assert_eq!(BookingStatus::parse("Pending"), None);
        assert_eq!(BookingStatus::parse(""), None);
    }

    #[test]
    fn test_forward_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Active));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Completed));
    }

    #[test]
    fn test_skipped_and_backward_transitions() {
        use BookingStatus::*;
        assert!(!Pending.can_transition_to(Active));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Active.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for from in [BookingStatus::Completed, BookingStatus::Cancelled] {
            for to in BookingStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_blocking_statuses() {
        assert!(BookingStatus::Pending.is_blocking());
        assert!(BookingStatus::Active.is_blocking());
        assert!(!BookingStatus::Completed.is_blocking());
        assert!(!BookingStatus::Cancelled.is_blocking());
    }

    #[test]
    fn test_range_requires_start_before_end() {
        assert!(DateRange::new(d("2024-06-05"), d("2024-06-01")).is_none());
        assert!(DateRange::new(d("2024-06-05"), d("2024-06-05")).is_none());
        let four_days = range("2024-06-01", "2024-06-05");
        assert_eq!(four_days.end - four_days.start, chrono::Duration::days(4));
    }

    #[test]
    fn test_storable_years() {
        assert!(range("2024-06-01", "2024-06-05").is_storable());
        assert!(range("9999-12-01", "9999-12-31").is_storable());

        let far = DateRange::new(
            d("9999-12-31"),
            NaiveDate::from_ymd_opt(10000, 1, 2).unwrap(),
        )
        .unwrap();
        assert!(!far.is_storable());
    }

    #[test]
    fn test_overlap() {
        let base = range("2024-06-01", "2024-06-05");
        assert!(base.overlaps(&range("2024-06-03", "2024-06-08")));
        assert!(base.overlaps(&range("2024-05-20", "2024-06-02")));
        assert!(base.overlaps(&range("2024-06-02", "2024-06-03")));
        // Adjacent ranges share a boundary but not a day.
        assert!(!base.overlaps(&range("2024-06-05", "2024-06-10")));
        assert!(!base.overlaps(&range("2024-05-25", "2024-06-01")));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }

    fn booking(status: BookingStatus, price: f64) -> Booking {
        let now = d("2024-01-01").and_hms_opt(0, 0, 0).unwrap();
        Booking {
            id: 1,
            car_id: 1,
            user_id: 2,
            host_id: 3,
            start_date: d("2024-06-01"),
            end_date: d("2024-06-05"),
            status,
            total_price: price,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stats_counters_sum_to_total() {
        let bookings = vec![
            booking(BookingStatus::Pending, 100.0),
            booking(BookingStatus::Confirmed, 50.0),
            booking(BookingStatus::Completed, 200.0),
            booking(BookingStatus::Completed, 25.5),
            booking(BookingStatus::Cancelled, 80.0),
            booking(BookingStatus::Active, 10.0),
        ];
        let stats: BookingStats = bookings.iter().collect();

        assert_eq!(stats.total, 6);
        assert_eq!(
            stats.pending + stats.confirmed + stats.active + stats.completed + stats.cancelled,
            stats.total
        );
        assert_eq!(stats.completed, 2);
        assert!((stats.total_revenue - 225.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = BookingStats::default();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalRevenue"], 0.0);
        assert_eq!(json["total"], 0);
    }
}
