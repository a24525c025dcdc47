pub mod memory_repository;
pub mod postgres_repository;

// Re-export all repositories for convenient access
pub use memory_repository::{MemoryRepository, SeedData};
pub use postgres_repository::PostgresRepository;

use crate::error::RepositoryError;
use crate::models::{Booking, HoldingPriceHistoryEntry, PriceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Storage for bookings, their price checks and holding price timeline
///
/// One implementation is chosen at startup and shared behind an `Arc`;
/// callers never branch on which backend they are talking to.
#[async_trait]
pub trait TrackerRepository: Send + Sync {
    /// Insert a booking; a holding price opens the first history entry at `created_at`
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, RepositoryError>;

    /// Find a booking by id, active or not
    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, RepositoryError>;

    /// Active bookings ordered by pickup date
    async fn find_active_bookings(&self) -> Result<Vec<Booking>, RepositoryError>;

    /// Flip the active flag. Returns false when no booking has this id
    async fn set_booking_active(&self, id: &str, active: bool) -> Result<bool, RepositoryError>;

    /// Set the holding price
    ///
    /// With `record_history`, the open history entry is closed at `at` and a
    /// new one opened (when `price` is set) in the same atomic step.
    async fn update_holding_price(
        &self,
        id: &str,
        price: Option<Decimal>,
        record_history: bool,
        at: DateTime<Utc>,
    ) -> Result<Booking, RepositoryError>;

    /// Append a price check. Fails with `Duplicate` on a repeated timestamp
    async fn insert_price_record(&self, record: &PriceRecord) -> Result<PriceRecord, RepositoryError>;

    /// Price checks for a booking, oldest first
    async fn find_price_records(&self, booking_id: &str) -> Result<Vec<PriceRecord>, RepositoryError>;

    /// Holding price timeline for a booking, oldest first
    async fn find_holding_price_history(
        &self,
        booking_id: &str,
    ) -> Result<Vec<HoldingPriceHistoryEntry>, RepositoryError>;
}
