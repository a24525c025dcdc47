//! Derived price metrics for tracked bookings.

pub mod aggregate;

pub use aggregate::{current_date, BookingMetrics};
