use anyhow::Context;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_date, format_datetime, now, parse_date, parse_datetime};
use crate::models::{
    Booking, BookingFilter, BookingScope, BookingStatus, NewBooking, PageRequest,
};
use crate::repository::BookingRepository;

const BOOKING_COLUMNS: &str = "b.id, b.car_id, b.user_id, b.host_id, b.start_date, b.end_date, \
     b.status, b.total_price, b.notes, b.created_at, b.updated_at";

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(6)?;
    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;

    Ok(Booking {
        id: row.get(0)?,
        car_id: row.get(1)?,
        user_id: row.get(2)?,
        host_id: row.get(3)?,
        start_date: parse_date(4, &row.get::<_, String>(4)?)?,
        end_date: parse_date(5, &row.get::<_, String>(5)?)?,
        status,
        total_price: row.get(7)?,
        notes: row.get(8)?,
        created_at: parse_datetime(9, &row.get::<_, String>(9)?)?,
        updated_at: parse_datetime(10, &row.get::<_, String>(10)?)?,
    })
}

// Host listings traverse the car relation rather than trusting the
// denormalized `host_id`.
fn filter_clause(filter: &BookingFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    match filter.scope {
        BookingScope::Host(host_id) => {
            params.push(Box::new(host_id));
            clauses.push(format!("c.host_id = ?{}", params.len()));
        }
        BookingScope::User(user_id) => {
            params.push(Box::new(user_id));
            clauses.push(format!("b.user_id = ?{}", params.len()));
        }
    }

    if let Some(status) = filter.status {
        params.push(Box::new(status.as_str()));
        clauses.push(format!("b.status = ?{}", params.len()));
    }

    (
        format!(
            "FROM bookings b JOIN cars c ON c.id = b.car_id WHERE {}",
            clauses.join(" AND ")
        ),
        params,
    )
}

impl BookingRepository for Connection {
    fn insert_booking(&self, booking: &NewBooking) -> anyhow::Result<Booking> {
        let ts = format_datetime(&now());
        self.execute(
            "INSERT INTO bookings (car_id, user_id, host_id, start_date, end_date, status, total_price, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                booking.car_id,
                booking.user_id,
                booking.host_id,
                format_date(&booking.range.start),
                format_date(&booking.range.end),
                BookingStatus::Pending.as_str(),
                booking.total_price,
                booking.notes,
                ts,
            ],
        )
        .context("failed to insert booking")?;

        let id = self.last_insert_rowid();
        self.find_booking(id)?
            .with_context(|| format!("booking {id} missing after insert"))
    }

    fn find_booking(&self, id: i64) -> anyhow::Result<Option<Booking>> {
        let booking = self
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
                params![id],
                parse_booking_row,
            )
            .optional()
            .context("failed to load booking")?;
        Ok(booking)
    }

    fn blocking_bookings_for_car(&self, car_id: i64) -> anyhow::Result<Vec<Booking>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.car_id = ?1 AND b.status IN ('pending', 'confirmed', 'active')
             ORDER BY b.start_date ASC"
        ))?;
        let rows = stmt.query_map(params![car_id], parse_booking_row)?;
        let bookings = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load bookings for car")?;
        Ok(bookings)
    }

    fn update_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> anyhow::Result<Option<Booking>> {
        let count = self
            .execute(
                "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), format_datetime(&now()), id],
            )
            .context("failed to update booking status")?;
        if count == 0 {
            return Ok(None);
        }
        self.find_booking(id)
    }

    fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> anyhow::Result<Vec<Booking>> {
        let (from_where, mut params_vec) = filter_clause(filter);
        params_vec.push(Box::new(page.limit()));
        params_vec.push(Box::new(page.offset()));
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} {from_where} ORDER BY b.created_at DESC, b.id DESC LIMIT ?{} OFFSET ?{}",
            params_vec.len() - 1,
            params_vec.len()
        );

        let mut stmt = self.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), parse_booking_row)?;
        let bookings = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to list bookings")?;
        Ok(bookings)
    }

    fn count_bookings(&self, filter: &BookingFilter) -> anyhow::Result<u64> {
        let (from_where, params_vec) = filter_clause(filter);
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count: i64 = self
            .query_row(
                &format!("SELECT COUNT(*) {from_where}"),
                params_refs.as_slice(),
                |row| row.get(0),
            )
            .context("failed to count bookings")?;
        Ok(count as u64)
    }

    fn bookings_for_host(&self, host_id: i64) -> anyhow::Result<Vec<Booking>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b JOIN cars c ON c.id = b.car_id
             WHERE c.host_id = ?1 ORDER BY b.created_at DESC, b.id DESC"
        ))?;
        let rows = stmt.query_map(params![host_id], parse_booking_row)?;
        let bookings = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load host bookings")?;
        Ok(bookings)
    }

    fn bookings_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Booking>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.user_id = ?1 ORDER BY b.created_at DESC, b.id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], parse_booking_row)?;
        let bookings = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load user bookings")?;
        Ok(bookings)
    }
}
