//! Domain models for the rental tracker.
//!
//! Bookings, their append-only price check history and the holding price
//! timeline, normalized at the storage boundary.

pub mod booking;
pub mod holding_price;
pub mod price_record;

// Re-export all models for convenient access
pub use booking::{
    booking_id, location_full_name, parse_booking_date, round_price, Booking, NewBooking,
    DEFAULT_RENTAL_TIME,
};
pub use holding_price::{holding_price_at, HoldingPriceHistoryEntry};
pub use price_record::{normalize_prices, prices_to_json, NewPriceRecord, PriceRecord, PriceRecordRow};
