use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One period during which a holding price was in effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HoldingPriceHistoryEntry {
    pub id: Uuid,
    pub booking_id: String,
    pub price: Decimal,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>, // None while still in effect
}

impl HoldingPriceHistoryEntry {
    /// Open a new entry starting at `effective_from`
    pub fn open(booking_id: impl Into<String>, price: Decimal, effective_from: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: booking_id.into(),
            price,
            effective_from,
            effective_to: None,
        }
    }

    /// Check if this entry is currently in effect
    pub fn is_open(&self) -> bool {
        self.effective_to.is_none()
    }

    /// Check if the entry covered the given instant
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at >= self.effective_from && self.effective_to.map_or(true, |end| at < end)
    }
}

/// Holding price in effect at `at`, looking through a booking's history
pub fn holding_price_at(history: &[HoldingPriceHistoryEntry], at: DateTime<Utc>) -> Option<Decimal> {
    history
        .iter()
        .filter(|entry| entry.covers(at))
        .max_by_key(|entry| entry.effective_from)
        .map(|entry| entry.price)
}
