//! In-process tracker repository, used for local runs and tests

use super::TrackerRepository;
use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{Booking, HoldingPriceHistoryEntry, PriceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Initial contents for a [`MemoryRepository`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub price_records: Vec<PriceRecord>,
    #[serde(default)]
    pub holding_price_history: Vec<HoldingPriceHistoryEntry>,
}

impl SeedData {
    /// Load seed data from a JSON file
    pub async fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let seed: SeedData = serde_json::from_str(&raw)?;
        Ok(seed)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    bookings: HashMap<String, Booking>,
    price_records: Vec<PriceRecord>,
    holding_history: Vec<HoldingPriceHistoryEntry>,
}

/// Repository keeping everything in memory behind one lock
///
/// Every operation takes the lock once, so multi-step updates (closing and
/// reopening a holding price entry) are atomic to other callers.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-filled with seed data
    ///
    /// Bookings must be valid and unique or the whole seed is rejected.
    /// Price records and holding entries that break a storage rule are
    /// skipped with a warning: unknown booking, duplicate check timestamp,
    /// negative price, a second open holding entry, or an entry ending
    /// before it starts.
    pub fn from_seed(seed: SeedData) -> AppResult<Self> {
        info!(
            "Seeding memory repository: {} bookings, {} price records, {} holding entries",
            seed.bookings.len(),
            seed.price_records.len(),
            seed.holding_price_history.len()
        );

        let mut state = MemoryState::default();

        for booking in seed.bookings {
            if booking.dropoff_date < booking.pickup_date {
                return Err(AppError::Validation(format!(
                    "Seed booking {} has dropoff before pickup",
                    booking.id
                )));
            }
            if booking.holding_price.map_or(false, |price| price < Decimal::ZERO) {
                return Err(AppError::Validation(format!(
                    "Seed booking {} has a negative holding price",
                    booking.id
                )));
            }
            if state.bookings.contains_key(&booking.id) {
                return Err(AppError::Validation(format!(
                    "Seed booking {} appears more than once",
                    booking.id
                )));
            }
            state.bookings.insert(booking.id.clone(), booking);
        }

        for record in seed.price_records {
            if !state.bookings.contains_key(&record.booking_id) {
                warn!("Skipping seed price record {}: unknown booking {}", record.id, record.booking_id);
                continue;
            }
            let duplicate = state
                .price_records
                .iter()
                .any(|existing| existing.booking_id == record.booking_id && existing.timestamp == record.timestamp);
            if duplicate {
                warn!(
                    "Skipping seed price record {}: {} already has a check at {}",
                    record.id, record.booking_id, record.timestamp
                );
                continue;
            }
            state.price_records.push(record);
        }

        for entry in seed.holding_price_history {
            if !state.bookings.contains_key(&entry.booking_id) {
                warn!("Skipping seed holding entry {}: unknown booking {}", entry.id, entry.booking_id);
                continue;
            }
            if entry.price < Decimal::ZERO {
                warn!("Skipping seed holding entry {}: negative price {}", entry.id, entry.price);
                continue;
            }
            if entry.effective_to.map_or(false, |end| end < entry.effective_from) {
                warn!("Skipping seed holding entry {}: ends before it starts", entry.id);
                continue;
            }
            let second_open = entry.is_open()
                && state
                    .holding_history
                    .iter()
                    .any(|existing| existing.booking_id == entry.booking_id && existing.is_open());
            if second_open {
                warn!(
                    "Skipping seed holding entry {}: {} already has an open entry",
                    entry.id, entry.booking_id
                );
                continue;
            }
            state.holding_history.push(entry);
        }

        Ok(Self {
            state: RwLock::new(state),
        })
    }
}

#[async_trait]
impl TrackerRepository for MemoryRepository {
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, RepositoryError> {
        let mut state = self.state.write().await;

        if state.bookings.contains_key(&booking.id) {
            return Err(RepositoryError::Duplicate(format!(
                "Booking {} already exists",
                booking.id
            )));
        }

        if let Some(price) = booking.holding_price {
            state.holding_history.push(HoldingPriceHistoryEntry::open(
                booking.id.clone(),
                price,
                booking.created_at,
            ));
        }

        state.bookings.insert(booking.id.clone(), booking.clone());
        Ok(booking.clone())
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.bookings.get(id).cloned())
    }

    async fn find_active_bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        let state = self.state.read().await;

        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|booking| booking.active)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.pickup_date.cmp(&b.pickup_date).then_with(|| a.id.cmp(&b.id)));

        Ok(bookings)
    }

    async fn set_booking_active(&self, id: &str, active: bool) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;

        match state.bookings.get_mut(id) {
            Some(booking) => {
                booking.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_holding_price(
        &self,
        id: &str,
        price: Option<Decimal>,
        record_history: bool,
        at: DateTime<Utc>,
    ) -> Result<Booking, RepositoryError> {
        let mut state = self.state.write().await;

        if !state.bookings.contains_key(id) {
            return Err(RepositoryError::NotFound(format!("Booking {} not found", id)));
        }

        // Check everything before mutating so a rejected update leaves no trace
        let ends_before_start = record_history
            && state
                .holding_history
                .iter()
                .any(|entry| entry.booking_id == id && entry.is_open() && at < entry.effective_from);
        if ends_before_start {
            return Err(RepositoryError::ConstraintViolation(format!(
                "Holding price entry for {} cannot end before it starts",
                id
            )));
        }

        let booking = state
            .bookings
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Booking {} not found", id)))?;
        booking.holding_price = price;
        let updated = booking.clone();

        if record_history {
            for entry in state
                .holding_history
                .iter_mut()
                .filter(|entry| entry.booking_id == id && entry.is_open())
            {
                entry.effective_to = Some(at);
            }

            if let Some(price) = price {
                state
                    .holding_history
                    .push(HoldingPriceHistoryEntry::open(id, price, at));
            }
        }

        Ok(updated)
    }

    async fn insert_price_record(&self, record: &PriceRecord) -> Result<PriceRecord, RepositoryError> {
        let mut state = self.state.write().await;

        if !state.bookings.contains_key(&record.booking_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "Booking {} does not exist",
                record.booking_id
            )));
        }

        let duplicate = state
            .price_records
            .iter()
            .any(|existing| existing.booking_id == record.booking_id && existing.timestamp == record.timestamp);
        if duplicate {
            return Err(RepositoryError::Duplicate(format!(
                "Price record for {} at {} already exists",
                record.booking_id, record.timestamp
            )));
        }

        state.price_records.push(record.clone());
        Ok(record.clone())
    }

    async fn find_price_records(&self, booking_id: &str) -> Result<Vec<PriceRecord>, RepositoryError> {
        let state = self.state.read().await;

        let mut records: Vec<PriceRecord> = state
            .price_records
            .iter()
            .filter(|record| record.booking_id == booking_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.timestamp);

        Ok(records)
    }

    async fn find_holding_price_history(
        &self,
        booking_id: &str,
    ) -> Result<Vec<HoldingPriceHistoryEntry>, RepositoryError> {
        let state = self.state.read().await;

        let mut entries: Vec<HoldingPriceHistoryEntry> = state
            .holding_history
            .iter()
            .filter(|entry| entry.booking_id == booking_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.effective_from);

        Ok(entries)
    }
}
