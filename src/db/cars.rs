use anyhow::Context;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_date, format_datetime, now, parse_datetime};
use crate::models::{Car, CarSearch, NewCar, PageRequest};
use crate::repository::CarRepository;

const CAR_COLUMNS: &str = "c.id, c.host_id, c.category_id, c.name, c.description, c.price_per_day, \
     c.is_available, c.location, c.passengers, c.transmission, c.fuel_type, c.rating, \
     c.created_at, c.updated_at";

fn parse_car_row(row: &Row) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get(0)?,
        host_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        price_per_day: row.get(5)?,
        is_available: row.get::<_, i32>(6)? != 0,
        location: row.get(7)?,
        passengers: row.get(8)?,
        transmission: row.get(9)?,
        fuel_type: row.get(10)?,
        rating: row.get(11)?,
        created_at: parse_datetime(12, &row.get::<_, String>(12)?)?,
        updated_at: parse_datetime(13, &row.get::<_, String>(13)?)?,
    })
}

struct SearchSql {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl SearchSql {
    fn new() -> Self {
        Self {
            clauses: vec!["c.is_available = 1".to_string()],
            params: Vec::new(),
        }
    }

    // Binds `value` and substitutes its placeholder for every `?` in `clause`.
    fn push(&mut self, clause: &str, value: impl ToSql + 'static) {
        self.params.push(Box::new(value));
        let placeholder = format!("?{}", self.params.len());
        self.clauses.push(clause.replace('?', &placeholder));
    }

    fn build(search: &CarSearch) -> Self {
        let mut sql = Self::new();

        if let Some(text) = &search.text {
            sql.push(
                "(instr(ulower(c.name), ulower(?)) > 0 OR instr(ulower(c.description), ulower(?)) > 0)",
                text.clone(),
            );
        }
        if let Some(category_id) = search.category_id {
            sql.push("c.category_id = ?", category_id);
        }
        if let Some(location) = &search.location {
            sql.push("instr(ulower(c.location), ulower(?)) > 0", location.clone());
        }
        if let Some(min) = search.min_price {
            sql.push("c.price_per_day >= ?", min);
        }
        if let Some(max) = search.max_price {
            sql.push("c.price_per_day <= ?", max);
        }
        if let Some(passengers) = search.min_passengers {
            sql.push("c.passengers >= ?", passengers);
        }
        if let Some(transmission) = &search.transmission {
            sql.push("c.transmission = ?", transmission.clone());
        }
        if let Some(fuel_type) = &search.fuel_type {
            sql.push("c.fuel_type = ?", fuel_type.clone());
        }
        if let Some(rating) = search.min_rating {
            sql.push("c.rating >= ?", rating);
        }
        if let Some(host_id) = search.host_id {
            sql.push("c.host_id = ?", host_id);
        }
        if let Some(range) = search.free_during {
            // Same half-open overlap test as booking creation.
            sql.params.push(Box::new(format_date(&range.end)));
            let end = sql.params.len();
            sql.params.push(Box::new(format_date(&range.start)));
            let start = sql.params.len();
            sql.clauses.push(format!(
                "NOT EXISTS (SELECT 1 FROM bookings b WHERE b.car_id = c.id \
                 AND b.status IN ('pending', 'confirmed', 'active') \
                 AND b.start_date < ?{end} AND ?{start} < b.end_date)"
            ));
        }

        sql
    }

    fn where_clause(&self) -> String {
        self.clauses.join(" AND ")
    }

    fn refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

impl CarRepository for Connection {
    fn insert_car(&self, car: &NewCar) -> anyhow::Result<Car> {
        let ts = format_datetime(&now());
        self.execute(
            "INSERT INTO cars (host_id, category_id, name, description, price_per_day, is_available, location, passengers, transmission, fuel_type, rating, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                car.host_id,
                car.category_id,
                car.name,
                car.description,
                car.price_per_day,
                car.is_available as i32,
                car.location,
                car.passengers,
                car.transmission,
                car.fuel_type,
                car.rating,
                ts,
            ],
        )
        .context("failed to insert car")?;

        let id = self.last_insert_rowid();
        self.find_car(id)?
            .with_context(|| format!("car {id} missing after insert"))
    }

    fn find_car(&self, id: i64) -> anyhow::Result<Option<Car>> {
        let car = self
            .query_row(
                &format!("SELECT {CAR_COLUMNS} FROM cars c WHERE c.id = ?1"),
                params![id],
                parse_car_row,
            )
            .optional()
            .context("failed to load car")?;
        Ok(car)
    }

    fn search_cars(&self, search: &CarSearch, limit: i64, offset: i64) -> anyhow::Result<Vec<Car>> {
        let mut sql = SearchSql::build(search);
        sql.params.push(Box::new(limit));
        sql.params.push(Box::new(offset));
        let query = format!(
            "SELECT {CAR_COLUMNS} FROM cars c WHERE {} ORDER BY c.rating DESC, c.id ASC LIMIT ?{} OFFSET ?{}",
            sql.where_clause(),
            sql.params.len() - 1,
            sql.params.len()
        );

        let mut stmt = self.prepare(&query)?;
        let rows = stmt.query_map(sql.refs().as_slice(), parse_car_row)?;
        let cars = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to search cars")?;
        Ok(cars)
    }

    fn count_cars(&self, search: &CarSearch) -> anyhow::Result<u64> {
        let sql = SearchSql::build(search);
        let count: i64 = self
            .query_row(
                &format!("SELECT COUNT(*) FROM cars c WHERE {}", sql.where_clause()),
                sql.refs().as_slice(),
                |row| row.get(0),
            )
            .context("failed to count cars")?;
        Ok(count as u64)
    }

    fn cars_for_host(&self, host_id: i64, page: Option<PageRequest>) -> anyhow::Result<Vec<Car>> {
        let (limit, offset) = page.map_or((-1, 0), |p| (p.limit(), p.offset()));
        let mut stmt = self.prepare(&format!(
            "SELECT {CAR_COLUMNS} FROM cars c WHERE c.host_id = ?1
             ORDER BY c.created_at DESC, c.id DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![host_id, limit, offset], parse_car_row)?;
        let cars = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load host cars")?;
        Ok(cars)
    }

    fn count_cars_for_host(&self, host_id: i64) -> anyhow::Result<u64> {
        let count: i64 = self
            .query_row(
                "SELECT COUNT(*) FROM cars WHERE host_id = ?1",
                params![host_id],
                |row| row.get(0),
            )
            .context("failed to count host cars")?;
        Ok(count as u64)
    }

    fn available_locations(&self, limit: i64) -> anyhow::Result<Vec<String>> {
        let mut stmt = self.prepare(
            "SELECT location FROM cars WHERE is_available = 1 AND trim(location) != ''
             GROUP BY location ORDER BY MIN(id) LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| row.get(0))?;
        let locations = rows
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("failed to load locations")?;
        Ok(locations)
    }
}
