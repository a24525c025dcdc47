use crate::services::BookingOverview;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// A booking whose current price dropped far enough below its holding price
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceAlert {
    pub booking_id: String,
    pub location: String,
    pub category: String,
    pub new_price: Decimal,
    pub old_price: Decimal,
    pub holding_price: Decimal,
    pub price_drop: Decimal,
}

/// Decides which bookings are worth rebooking
pub struct PriceAlertService {
    /// Minimum drop below the holding price (in dollars) to alert on
    threshold: Decimal,
}

impl PriceAlertService {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Alerts for bookings that are not yet over and dropped by at least the threshold
    pub fn check(&self, bookings: &[BookingOverview], today: NaiveDate) -> Vec<PriceAlert> {
        let mut expired = Vec::new();
        let mut alerts = Vec::new();

        for overview in bookings {
            let booking = &overview.booking;
            if booking.is_expired(today) {
                expired.push(booking.location.as_str());
                continue;
            }

            let Some(holding_price) = booking.holding_price else {
                continue;
            };
            let current = overview.metrics.latest_price;
            // No usable current price, nothing to compare
            if current <= Decimal::ZERO {
                continue;
            }

            let price_drop = holding_price - current;
            if price_drop >= self.threshold {
                info!(
                    "Significant price drop for {} ({}): {} below holding price",
                    booking.id, booking.location, price_drop
                );
                alerts.push(PriceAlert {
                    booking_id: booking.id.clone(),
                    location: booking.location.clone(),
                    category: booking.focus_category.clone(),
                    new_price: current,
                    old_price: overview.metrics.previous_price,
                    holding_price,
                    price_drop,
                });
            }
        }

        if !expired.is_empty() {
            debug!("Skipping expired bookings: {}", expired.join(", "));
        }

        alerts
    }
}

impl Default for PriceAlertService {
    fn default() -> Self {
        Self::new(Decimal::new(10, 0))
    }
}
