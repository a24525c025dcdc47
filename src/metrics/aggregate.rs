use crate::models::{Booking, PriceRecord};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display metrics derived from a booking and its price check history
///
/// Computed fresh on every fetch, never persisted. Every field is always
/// populated: missing data degrades to zero instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingMetrics {
    /// Focus price of the most recent check (0 when unavailable)
    pub latest_price: Decimal,
    /// Focus price of the check before the latest (0 when unavailable)
    pub previous_price: Decimal,
    pub price_change: Decimal,
    /// Unrounded; 0 when there is no previous price
    pub percent_change: Decimal,
    /// How much cheaper the current price is than the holding price, never negative
    pub potential_savings: Decimal,
    /// Focus price of the earliest check
    pub first_tracked_price: Decimal,
    pub change_from_baseline: Decimal,
    /// Minimum positive focus price ever seen, 0 if none
    pub lowest_price_seen: Decimal,
    /// Maximum positive focus price ever seen, 0 if none
    pub all_time_high: Decimal,
    pub average_price: Decimal,
    /// Number of checks that carried a positive focus price
    pub total_checks: usize,
    /// Signed calendar days from today to pickup
    pub days_until_pickup: i64,
}

impl BookingMetrics {
    /// Derive metrics for `booking` as of the calendar date `today`
    ///
    /// `records` may be empty and in any order; records belonging to another
    /// booking are ignored.
    pub fn compute(booking: &Booking, records: &[PriceRecord], today: NaiveDate) -> Self {
        let mut history: Vec<&PriceRecord> = records
            .iter()
            .filter(|record| record.booking_id == booking.id)
            .collect();
        // Ties on timestamp are broken by id so caller ordering never matters
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        let focus_price = |record: &PriceRecord| record.price_for(&booking.focus_category);

        let latest_price = history
            .last()
            .and_then(|record| focus_price(*record))
            .unwrap_or(Decimal::ZERO);

        // A single check has nothing to compare against, so it counts as unchanged
        let previous_price = match history.len() {
            0 => Decimal::ZERO,
            1 => latest_price,
            n => focus_price(history[n - 2]).unwrap_or(Decimal::ZERO),
        };

        let first_tracked_price = history
            .first()
            .and_then(|record| focus_price(*record))
            .unwrap_or(Decimal::ZERO);

        let price_change = latest_price - previous_price;
        let percent_change = percent_of(price_change, previous_price);

        let holding_price = booking.holding_price.unwrap_or(Decimal::ZERO);
        let potential_savings = (holding_price - latest_price).max(Decimal::ZERO);

        let seen: Vec<Decimal> = history
            .iter()
            .filter_map(|record| focus_price(*record))
            .filter(|price| *price > Decimal::ZERO)
            .collect();

        let lowest_price_seen = seen.iter().copied().min().unwrap_or(Decimal::ZERO);
        let all_time_high = seen.iter().copied().max().unwrap_or(Decimal::ZERO);
        let average_price = if seen.is_empty() {
            Decimal::ZERO
        } else {
            let total: Decimal = seen.iter().sum();
            total
                .checked_div(Decimal::from(seen.len()))
                .unwrap_or(Decimal::ZERO)
        };

        Self {
            latest_price,
            previous_price,
            price_change,
            percent_change,
            potential_savings,
            first_tracked_price,
            change_from_baseline: latest_price - first_tracked_price,
            lowest_price_seen,
            all_time_high,
            average_price,
            total_checks: seen.len(),
            days_until_pickup: days_until(booking.pickup_date, today),
        }
    }

    /// Same as [`BookingMetrics::compute`] with today's UTC date
    pub fn compute_now(booking: &Booking, records: &[PriceRecord]) -> Self {
        Self::compute(booking, records, current_date())
    }

    /// Check if the current price is the lowest ever tracked
    pub fn is_at_all_time_low(&self) -> bool {
        self.lowest_price_seen > Decimal::ZERO && self.latest_price == self.lowest_price_seen
    }

    /// Current price relative to the holding price, when one is set
    pub fn holding_delta(&self, booking: &Booking) -> Option<Decimal> {
        booking
            .holding_price
            .filter(|price| *price > Decimal::ZERO)
            .map(|holding| self.latest_price - holding)
    }
}

/// Calendar date in UTC that live dashboards and alerts are computed against
pub fn current_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// `change / base * 100`, or 0 when the base is zero
fn percent_of(change: Decimal, base: Decimal) -> Decimal {
    if base.is_zero() {
        return Decimal::ZERO;
    }
    change
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

fn days_until(pickup: NaiveDate, today: NaiveDate) -> i64 {
    pickup.signed_duration_since(today).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use std::collections::HashMap;
    use uuid::Uuid;

    const ECONOMY: &str = "Economy Car";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn booking(holding_price: Option<Decimal>) -> Booking {
        Booking {
            id: "KOA_04012025_04082025_EconomyCar".to_string(),
            location: "KOA".to_string(),
            location_full_name: "Kailua-Kona International Airport".to_string(),
            pickup_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            dropoff_date: NaiveDate::from_ymd_opt(2025, 4, 8).unwrap(),
            pickup_time: "12:00 PM".to_string(),
            dropoff_time: "12:00 PM".to_string(),
            focus_category: ECONOMY.to_string(),
            holding_price,
            active: true,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, hour, 0, 0).unwrap()
    }

    fn record(hour: u32, prices: &[(&str, i64)]) -> PriceRecord {
        PriceRecord {
            id: Uuid::new_v4(),
            booking_id: "KOA_04012025_04082025_EconomyCar".to_string(),
            timestamp: at(hour),
            prices: prices
                .iter()
                .map(|(category, price)| (category.to_string(), Decimal::new(*price, 0)))
                .collect::<HashMap<_, _>>(),
            created_at: at(hour),
        }
    }

    #[test]
    fn test_empty_history() {
        let metrics = BookingMetrics::compute(&booking(Some(Decimal::new(280, 0))), &[], today());

        assert_eq!(metrics.latest_price, Decimal::ZERO);
        assert_eq!(metrics.previous_price, Decimal::ZERO);
        assert_eq!(metrics.first_tracked_price, Decimal::ZERO);
        assert_eq!(metrics.lowest_price_seen, Decimal::ZERO);
        assert_eq!(metrics.all_time_high, Decimal::ZERO);
        assert_eq!(metrics.percent_change, Decimal::ZERO);
        assert_eq!(metrics.total_checks, 0);
        assert_eq!(metrics.potential_savings, Decimal::new(280, 0));

        let no_holding = BookingMetrics::compute(&booking(None), &[], today());
        assert_eq!(no_holding.potential_savings, Decimal::ZERO);
    }

    #[test]
    fn test_single_record() {
        let records = vec![record(1, &[(ECONOMY, 300)])];
        let metrics = BookingMetrics::compute(&booking(None), &records, today());

        assert_eq!(metrics.latest_price, Decimal::new(300, 0));
        assert_eq!(metrics.previous_price, Decimal::new(300, 0));
        assert_eq!(metrics.first_tracked_price, Decimal::new(300, 0));
        assert_eq!(metrics.price_change, Decimal::ZERO);
        assert_eq!(metrics.percent_change, Decimal::ZERO);
        assert_eq!(metrics.change_from_baseline, Decimal::ZERO);
        assert!(metrics.is_at_all_time_low());
    }

    #[test]
    fn test_price_drop_example() {
        let records = vec![record(1, &[(ECONOMY, 300)]), record(2, &[(ECONOMY, 250)])];
        let metrics = BookingMetrics::compute(&booking(Some(Decimal::new(280, 0))), &records, today());

        assert_eq!(metrics.latest_price, Decimal::new(250, 0));
        assert_eq!(metrics.previous_price, Decimal::new(300, 0));
        assert_eq!(metrics.price_change, Decimal::new(-50, 0));
        assert_eq!(metrics.percent_change.round_dp(2), Decimal::new(-1667, 2));
        assert_eq!(metrics.potential_savings, Decimal::new(30, 0));
        assert_eq!(metrics.first_tracked_price, Decimal::new(300, 0));
        assert_eq!(metrics.change_from_baseline, Decimal::new(-50, 0));
        assert_eq!(metrics.lowest_price_seen, Decimal::new(250, 0));
        assert_eq!(metrics.all_time_high, Decimal::new(300, 0));
        assert_eq!(metrics.average_price, Decimal::new(275, 0));
        assert_eq!(metrics.total_checks, 2);
    }

    #[test]
    fn test_missing_focus_category() {
        let records = vec![record(1, &[])];
        let metrics = BookingMetrics::compute(&booking(None), &records, today());

        assert_eq!(metrics.latest_price, Decimal::ZERO);
        assert_eq!(metrics.lowest_price_seen, Decimal::ZERO);
        assert_eq!(metrics.all_time_high, Decimal::ZERO);
        assert!(!metrics.is_at_all_time_low());
    }

    #[test]
    fn test_latest_missing_category_falls_back_to_zero() {
        let records = vec![
            record(1, &[(ECONOMY, 300)]),
            record(2, &[(ECONOMY, 280)]),
            record(3, &[("Compact Car", 310)]),
        ];
        let metrics = BookingMetrics::compute(&booking(Some(Decimal::new(290, 0))), &records, today());

        assert_eq!(metrics.latest_price, Decimal::ZERO);
        assert_eq!(metrics.previous_price, Decimal::new(280, 0));
        assert_eq!(metrics.price_change, Decimal::new(-280, 0));
        // Min/max skip the record without a focus price
        assert_eq!(metrics.lowest_price_seen, Decimal::new(280, 0));
        assert_eq!(metrics.all_time_high, Decimal::new(300, 0));
        assert_eq!(metrics.potential_savings, Decimal::new(290, 0));
    }

    #[test]
    fn test_zero_prices_excluded_from_low_and_high() {
        let records = vec![record(1, &[(ECONOMY, 0)]), record(2, &[(ECONOMY, 0)])];
        let metrics = BookingMetrics::compute(&booking(None), &records, today());

        assert_eq!(metrics.lowest_price_seen, Decimal::ZERO);
        assert_eq!(metrics.all_time_high, Decimal::ZERO);
        assert_eq!(metrics.total_checks, 0);
        assert_eq!(metrics.percent_change, Decimal::ZERO);
    }

    #[test]
    fn test_negative_price_treated_as_absent() {
        let mut bad = record(2, &[]);
        bad.prices.insert(ECONOMY.to_string(), Decimal::new(-20, 0));
        let records = vec![record(1, &[(ECONOMY, 300)]), bad];
        let metrics = BookingMetrics::compute(&booking(None), &records, today());

        assert_eq!(metrics.latest_price, Decimal::ZERO);
        assert_eq!(metrics.lowest_price_seen, Decimal::new(300, 0));
    }

    #[test]
    fn test_savings_never_negative() {
        let records = vec![record(1, &[(ECONOMY, 100)])];

        let metrics = BookingMetrics::compute(&booking(None), &records, today());
        assert_eq!(metrics.potential_savings, Decimal::ZERO);

        let metrics = BookingMetrics::compute(&booking(Some(Decimal::new(80, 0))), &records, today());
        assert_eq!(metrics.potential_savings, Decimal::ZERO);
        assert_eq!(metrics.holding_delta(&booking(Some(Decimal::new(80, 0)))), Some(Decimal::new(20, 0)));
        assert_eq!(metrics.holding_delta(&booking(None)), None);
    }

    #[test]
    fn test_order_independent() {
        let sorted = vec![
            record(1, &[(ECONOMY, 320)]),
            record(2, &[(ECONOMY, 290)]),
            record(3, &[(ECONOMY, 305)]),
            record(4, &[(ECONOMY, 260)]),
        ];
        let mut shuffled = vec![
            sorted[2].clone(),
            sorted[0].clone(),
            sorted[3].clone(),
            sorted[1].clone(),
        ];

        let expected = BookingMetrics::compute(&booking(Some(Decimal::new(300, 0))), &sorted, today());
        assert_eq!(
            BookingMetrics::compute(&booking(Some(Decimal::new(300, 0))), &shuffled, today()),
            expected
        );

        shuffled.reverse();
        assert_eq!(
            BookingMetrics::compute(&booking(Some(Decimal::new(300, 0))), &shuffled, today()),
            expected
        );
        assert_eq!(expected.latest_price, Decimal::new(260, 0));
        assert_eq!(expected.previous_price, Decimal::new(305, 0));
        assert_eq!(expected.first_tracked_price, Decimal::new(320, 0));
    }

    #[test]
    fn test_idempotent() {
        let b = booking(Some(Decimal::new(280, 0)));
        let records = vec![record(1, &[(ECONOMY, 300)]), record(2, &[(ECONOMY, 250)])];

        let first = BookingMetrics::compute(&b, &records, today());
        let second = BookingMetrics::compute(&b, &records, today());
        assert_eq!(first, second);
    }

    #[test]
    fn test_other_bookings_records_ignored() {
        let mut foreign = record(5, &[(ECONOMY, 10)]);
        foreign.booking_id = "HNL_04012025_04082025".to_string();
        let records = vec![record(1, &[(ECONOMY, 300)]), foreign];

        let metrics = BookingMetrics::compute(&booking(None), &records, today());
        assert_eq!(metrics.latest_price, Decimal::new(300, 0));
        assert_eq!(metrics.lowest_price_seen, Decimal::new(300, 0));
    }

    #[test]
    fn test_days_until_pickup() {
        let b = booking(None);

        let metrics = BookingMetrics::compute(&b, &[], NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(metrics.days_until_pickup, 0);

        let metrics = BookingMetrics::compute(&b, &[], NaiveDate::from_ymd_opt(2025, 3, 25).unwrap());
        assert_eq!(metrics.days_until_pickup, 7);

        let metrics = BookingMetrics::compute(&b, &[], NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());
        assert_eq!(metrics.days_until_pickup, -2);
    }

    #[test]
    fn test_pickup_today_ignores_time_of_day() {
        let b = booking(None);
        let late_evening = Utc.with_ymd_and_hms(2025, 4, 1, 23, 59, 59).unwrap();
        let early_morning = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 1).unwrap();

        for now in [late_evening, early_morning] {
            let metrics = BookingMetrics::compute(&b, &[], now.date_naive());
            assert_eq!(metrics.days_until_pickup, 0);
        }
    }

    #[test]
    fn test_compute_now_matches_compute_on_current_date() {
        let mut b = booking(Some(Decimal::new(280, 0)));
        let history = vec![record(0, &[(ECONOMY, 300)]), record(1, &[(ECONOMY, 250)])];

        let before = current_date();
        b.pickup_date = before + chrono::Duration::days(10);
        let metrics = BookingMetrics::compute_now(&b, &history);
        let after = current_date();

        // The date may roll over between the two reads
        assert!(metrics.days_until_pickup == 10 || metrics.days_until_pickup == (b.pickup_date - after).num_days());
        let expected = BookingMetrics {
            days_until_pickup: metrics.days_until_pickup,
            ..BookingMetrics::compute(&b, &history, before)
        };
        assert_eq!(metrics, expected);
        assert_eq!(metrics.potential_savings, Decimal::new(30, 0));
    }
}
