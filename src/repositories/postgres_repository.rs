//! PostgreSQL-backed tracker repository

use super::TrackerRepository;
use crate::error::RepositoryError;
use crate::models::{Booking, HoldingPriceHistoryEntry, PriceRecord, PriceRecordRow, prices_to_json};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

const BOOKING_COLUMNS: &str = r#"
    id,
    location,
    location_full_name,
    pickup_date,
    dropoff_date,
    pickup_time,
    dropoff_time,
    focus_category,
    holding_price,
    active,
    created_at
"#;

/// Repository for booking and price history data access
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new PostgresRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackerRepository for PostgresRepository {
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (
                id, location, location_full_name, pickup_date, dropoff_date,
                pickup_time, dropoff_time, focus_category, holding_price, active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(&booking.id)
        .bind(&booking.location)
        .bind(&booking.location_full_name)
        .bind(booking.pickup_date)
        .bind(booking.dropoff_date)
        .bind(&booking.pickup_time)
        .bind(&booking.dropoff_time)
        .bind(&booking.focus_category)
        .bind(booking.holding_price)
        .bind(booking.active)
        .bind(booking.created_at)
        .fetch_one(&mut tx)
        .await?;

        if let Some(price) = inserted.holding_price {
            sqlx::query(
                r#"
                INSERT INTO holding_price_histories (id, booking_id, price, effective_from)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&inserted.id)
            .bind(price)
            .bind(inserted.created_at)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, RepositoryError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn find_active_bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE active = TRUE
            ORDER BY pickup_date ASC, id ASC
            "#,
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn set_booking_active(&self, id: &str, active: bool) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE bookings SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_holding_price(
        &self,
        id: &str,
        price: Option<Decimal>,
        record_history: bool,
        at: DateTime<Utc>,
    ) -> Result<Booking, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET holding_price = $2
            WHERE id = $1
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(price)
        .fetch_optional(&mut tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Booking {} not found", id)))?;

        if record_history {
            // Close and reopen inside the same transaction so the timeline never gaps
            sqlx::query(
                r#"
                UPDATE holding_price_histories
                SET effective_to = $2
                WHERE booking_id = $1 AND effective_to IS NULL
                "#,
            )
            .bind(id)
            .bind(at)
            .execute(&mut tx)
            .await?;

            if let Some(price) = price {
                sqlx::query(
                    r#"
                    INSERT INTO holding_price_histories (id, booking_id, price, effective_from)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(id)
                .bind(price)
                .bind(at)
                .execute(&mut tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(booking)
    }

    async fn insert_price_record(&self, record: &PriceRecord) -> Result<PriceRecord, RepositoryError> {
        let row = sqlx::query_as::<_, PriceRecordRow>(
            r#"
            INSERT INTO price_histories (id, booking_id, timestamp, prices, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, booking_id, timestamp, prices, created_at
            "#,
        )
        .bind(record.id)
        .bind(&record.booking_id)
        .bind(record.timestamp)
        .bind(prices_to_json(&record.prices))
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_price_records(&self, booking_id: &str) -> Result<Vec<PriceRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, PriceRecordRow>(
            r#"
            SELECT id, booking_id, timestamp, prices, created_at
            FROM price_histories
            WHERE booking_id = $1
            ORDER BY timestamp ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }

    async fn find_holding_price_history(
        &self,
        booking_id: &str,
    ) -> Result<Vec<HoldingPriceHistoryEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, HoldingPriceHistoryEntry>(
            r#"
            SELECT id, booking_id, price, effective_from, effective_to
            FROM holding_price_histories
            WHERE booking_id = $1
            ORDER BY effective_from ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
