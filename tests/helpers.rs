#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rental_tracker::config::DatabaseConfig;
use rental_tracker::database::{create_pool, run_migrations};
use rental_tracker::metrics::current_date;
use rental_tracker::models::*;
use rental_tracker::repositories::*;
use rental_tracker::services::BookingService;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const ECONOMY: &str = "Economy Car";
pub const COMPACT: &str = "Compact Car";

/// Booking service over a fresh in-memory repository
pub fn memory_service() -> (Arc<MemoryRepository>, BookingService) {
    let repo = Arc::new(MemoryRepository::new());
    let service = BookingService::new(repo.clone());
    (repo, service)
}

/// Admin input for a booking at `location` with dates relative to today
pub fn new_booking(
    location: &str,
    pickup_in_days: i64,
    rental_days: i64,
    holding_price: Option<i64>,
) -> NewBooking {
    new_booking_from(current_date(), location, pickup_in_days, rental_days, holding_price)
}

/// Admin input for a booking with dates relative to `today`
pub fn new_booking_from(
    today: NaiveDate,
    location: &str,
    pickup_in_days: i64,
    rental_days: i64,
    holding_price: Option<i64>,
) -> NewBooking {
    let pickup = today + Duration::days(pickup_in_days);
    let dropoff = pickup + Duration::days(rental_days);

    NewBooking {
        location: location.to_string(),
        pickup_date: pickup.format("%m/%d/%Y").to_string(),
        dropoff_date: dropoff.format("%m/%d/%Y").to_string(),
        category: ECONOMY.to_string(),
        holding_price: holding_price.map(|price| Decimal::new(price, 0)),
        ..Default::default()
    }
}

/// Category price map from whole-dollar amounts
pub fn prices(entries: &[(&str, i64)]) -> HashMap<String, Decimal> {
    entries
        .iter()
        .map(|(category, price)| (category.to_string(), Decimal::new(*price, 0)))
        .collect()
}

/// Fixed check time, `hours` after a reference instant
pub fn check_time(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap() + Duration::hours(hours)
}

/// Test database configuration
pub struct TestDatabase {
    pub pool: PgPool,
    pub repo: Arc<PostgresRepository>,
}

impl TestDatabase {
    /// Connect to TEST_DATABASE_URL, or None when it is not set
    pub async fn connect() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

        let config = DatabaseConfig {
            url: database_url,
            max_connections: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 300,
            max_lifetime_secs: 600,
            test_before_acquire: true,
        };

        let pool = create_pool(&config)
            .await
            .expect("Failed to create test database pool");

        run_migrations(&pool, None)
            .await
            .expect("Failed to run migrations");

        Some(Self {
            repo: Arc::new(PostgresRepository::new(pool.clone())),
            pool,
        })
    }
}

/// Booking row with a unique id so database tests never collide
pub fn unique_booking(holding_price: Option<i64>) -> Booking {
    let mut booking = new_booking("KOA", 30, 7, holding_price)
        .into_booking(Utc::now())
        .expect("valid booking");
    booking.id = format!("{}_{}", booking.id, Uuid::new_v4().simple());
    booking
}

/// Assert that two bookings are equal (ignoring timestamps)
pub fn assert_bookings_equal(a: &Booking, b: &Booking) {
    assert_eq!(a.id, b.id);
    assert_eq!(a.location, b.location);
    assert_eq!(a.pickup_date, b.pickup_date);
    assert_eq!(a.dropoff_date, b.dropoff_date);
    assert_eq!(a.focus_category, b.focus_category);
    assert_eq!(a.holding_price, b.holding_price);
    assert_eq!(a.active, b.active);
}
