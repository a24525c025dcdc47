use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Display time used when the admin does not provide one
pub const DEFAULT_RENTAL_TIME: &str = "12:00 PM";

/// Booking model representing a tracked car-rental reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: String,
    pub location: String, // Airport code, e.g. KOA
    pub location_full_name: String,
    pub pickup_date: NaiveDate,
    pub dropoff_date: NaiveDate,
    pub pickup_time: String,
    pub dropoff_time: String,
    /// Vehicle class whose price is being watched
    pub focus_category: String,
    /// Price the rental is currently booked at
    pub holding_price: Option<Decimal>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Check if the rental period is over
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.dropoff_date < today
    }
}

/// Admin input for a new booking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBooking {
    pub location: String,
    pub pickup_date: String,
    pub dropoff_date: String,
    pub category: String,
    #[serde(default)]
    pub pickup_time: Option<String>,
    #[serde(default)]
    pub dropoff_time: Option<String>,
    #[serde(default)]
    pub holding_price: Option<Decimal>,
}

impl NewBooking {
    /// Id this input would be stored under, once its dates parse
    pub fn booking_id(&self) -> Result<String, String> {
        Ok(booking_id(
            &self.location.trim().to_uppercase(),
            parse_booking_date(&self.pickup_date)?,
            parse_booking_date(&self.dropoff_date)?,
            &self.category,
        ))
    }

    /// Validate the input and build the booking row to insert
    pub fn into_booking(self, created_at: DateTime<Utc>) -> Result<Booking, String> {
        let location = self.location.trim().to_uppercase();
        let category = self.category.trim().to_string();

        if location.is_empty()
            || self.pickup_date.trim().is_empty()
            || self.dropoff_date.trim().is_empty()
            || category.is_empty()
        {
            return Err("Missing required booking fields".to_string());
        }

        let pickup_date = parse_booking_date(&self.pickup_date)?;
        let dropoff_date = parse_booking_date(&self.dropoff_date)?;

        if dropoff_date < pickup_date {
            return Err(format!(
                "Dropoff date {} is before pickup date {}",
                dropoff_date, pickup_date
            ));
        }

        if let Some(price) = self.holding_price {
            if price < Decimal::ZERO {
                return Err(format!("Holding price must not be negative: {}", price));
            }
        }

        let id = booking_id(&location, pickup_date, dropoff_date, &category);

        Ok(Booking {
            id,
            location_full_name: location_full_name(&location),
            location,
            pickup_date,
            dropoff_date,
            pickup_time: self
                .pickup_time
                .unwrap_or_else(|| DEFAULT_RENTAL_TIME.to_string()),
            dropoff_time: self
                .dropoff_time
                .unwrap_or_else(|| DEFAULT_RENTAL_TIME.to_string()),
            focus_category: category,
            holding_price: self.holding_price.map(round_price),
            active: true,
            created_at,
        })
    }
}

/// Booking ids are `{location}_{MMDDYYYY}_{MMDDYYYY}_{category slug}`
///
/// The slug keeps only ASCII letters and digits, so one trip can be tracked
/// for several vehicle classes.
pub fn booking_id(location: &str, pickup: NaiveDate, dropoff: NaiveDate, category: &str) -> String {
    let slug: String = category.chars().filter(char::is_ascii_alphanumeric).collect();
    format!(
        "{}_{}_{}_{}",
        location,
        pickup.format("%m%d%Y"),
        dropoff.format("%m%d%Y"),
        slug
    )
}

/// Holding prices are stored to the cent
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp(2)
}

/// Full airport name for a location code
pub fn location_full_name(code: &str) -> String {
    match code {
        "KOA" => "Kailua-Kona International Airport".to_string(),
        "HNL" => "Daniel K. Inouye International Airport".to_string(),
        "OGG" => "Kahului Airport".to_string(),
        "LIH" => "Lihue Airport".to_string(),
        other => format!("{} Airport", other),
    }
}

/// Parse a booking date, discarding any time-of-day component
///
/// Accepts `MM/DD/YYYY`, `YYYY-MM-DD` and RFC 3339 timestamps.
pub fn parse_booking_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }

    Err(format!("Invalid date: {}", raw))
}
