use crate::error::{AppError, AppResult};
use crate::metrics::{current_date, BookingMetrics};
use crate::models::{
    round_price, Booking, HoldingPriceHistoryEntry, NewBooking, NewPriceRecord, PriceRecord,
};
use crate::repositories::TrackerRepository;
use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// A booking together with its history and derived metrics
#[derive(Debug, Clone, Serialize)]
pub struct BookingOverview {
    pub booking: Booking,
    pub price_history: Vec<PriceRecord>,
    pub holding_price_history: Vec<HoldingPriceHistoryEntry>,
    pub metrics: BookingMetrics,
}

/// Service for admin actions on bookings and the dashboard read path
pub struct BookingService {
    repo: Arc<dyn TrackerRepository>,
}

impl BookingService {
    pub fn new(repo: Arc<dyn TrackerRepository>) -> Self {
        Self { repo }
    }

    /// Start tracking a new booking
    pub async fn add_booking(&self, new_booking: NewBooking) -> AppResult<Booking> {
        let booking = new_booking
            .into_booking(Utc::now())
            .map_err(AppError::Validation)?;

        info!(
            "Adding booking {} ({} {} - {}, {})",
            booking.id, booking.location, booking.pickup_date, booking.dropoff_date, booking.focus_category
        );

        let booking = self.repo.insert_booking(&booking).await?;
        Ok(booking)
    }

    /// Stop tracking a booking. The row and its history are kept
    pub async fn delete_booking(&self, booking_id: &str) -> AppResult<()> {
        let updated = self.repo.set_booking_active(booking_id, false).await?;
        if !updated {
            return Err(AppError::NotFound(format!("Booking {} not found", booking_id)));
        }

        info!("Deactivated booking {}", booking_id);
        Ok(())
    }

    /// Change (or clear) the price a booking is held at
    pub async fn update_holding_price(
        &self,
        booking_id: &str,
        price: Option<Decimal>,
        record_history: bool,
    ) -> AppResult<Booking> {
        if let Some(price) = price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation(format!(
                    "Holding price must not be negative: {}",
                    price
                )));
            }
        }

        let booking = self
            .repo
            .update_holding_price(booking_id, price.map(round_price), record_history, Utc::now())
            .await?;

        match booking.holding_price {
            Some(price) => info!("Holding price for {} set to {}", booking.id, price),
            None => info!("Holding price for {} cleared", booking.id),
        }
        Ok(booking)
    }

    /// Store the result of one price check
    pub async fn record_price_check(&self, new_record: NewPriceRecord) -> AppResult<PriceRecord> {
        new_record.validate().map_err(AppError::Validation)?;

        if self.repo.find_booking(&new_record.booking_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Booking {} not found",
                new_record.booking_id
            )));
        }

        let record = self
            .repo
            .insert_price_record(&new_record.into_record(Utc::now()))
            .await?;

        info!(
            "Recorded price check for {} at {} ({} categories)",
            record.booking_id,
            record.timestamp,
            record.prices.len()
        );
        Ok(record)
    }

    /// One booking with history and metrics, as of today
    pub async fn booking_overview(&self, booking_id: &str) -> AppResult<BookingOverview> {
        let booking = self
            .repo
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

        self.overview_for(booking, current_date()).await
    }

    /// All active bookings ordered by pickup date, as of today
    pub async fn dashboard(&self) -> AppResult<Vec<BookingOverview>> {
        self.dashboard_on(current_date()).await
    }

    /// All active bookings ordered by pickup date, as of `today`
    pub async fn dashboard_on(&self, today: NaiveDate) -> AppResult<Vec<BookingOverview>> {
        let bookings = self.repo.find_active_bookings().await?;
        debug!("Building dashboard for {} active bookings", bookings.len());

        try_join_all(
            bookings
                .into_iter()
                .map(|booking| self.overview_for(booking, today)),
        )
        .await
    }

    async fn overview_for(&self, booking: Booking, today: NaiveDate) -> AppResult<BookingOverview> {
        let (price_history, holding_price_history) = tokio::try_join!(
            self.repo.find_price_records(&booking.id),
            self.repo.find_holding_price_history(&booking.id),
        )?;

        let metrics = BookingMetrics::compute(&booking, &price_history, today);

        Ok(BookingOverview {
            booking,
            price_history,
            holding_price_history,
            metrics,
        })
    }
}
