use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// One timestamped snapshot of prices across all categories for a booking
///
/// Records are append-only. `prices` only ever holds non-negative values;
/// anything else is dropped when the record crosses the storage boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: Uuid,
    pub booking_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_prices", deserialize_with = "deserialize_prices")]
    pub prices: HashMap<String, Decimal>,
    pub created_at: DateTime<Utc>,
}

impl PriceRecord {
    /// Price of one category, if the snapshot has a usable value for it
    pub fn price_for(&self, category: &str) -> Option<Decimal> {
        self.prices
            .get(category)
            .copied()
            .filter(|price| *price >= Decimal::ZERO)
    }
}

/// Raw `price_histories` row, prices still as stored JSONB
#[derive(Debug, Clone, FromRow)]
pub struct PriceRecordRow {
    pub id: Uuid,
    pub booking_id: String,
    pub timestamp: DateTime<Utc>,
    pub prices: Value,
    pub created_at: DateTime<Utc>,
}

impl From<PriceRecordRow> for PriceRecord {
    fn from(row: PriceRecordRow) -> Self {
        Self {
            id: row.id,
            booking_id: row.booking_id,
            timestamp: row.timestamp,
            prices: normalize_prices(&row.prices),
            created_at: row.created_at,
        }
    }
}

/// Input for appending a price check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPriceRecord {
    pub booking_id: String,
    pub timestamp: DateTime<Utc>,
    pub prices: HashMap<String, Decimal>,
}

impl NewPriceRecord {
    pub fn new(
        booking_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        prices: HashMap<String, Decimal>,
    ) -> Self {
        Self {
            booking_id: booking_id.into(),
            timestamp,
            prices,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.booking_id.trim().is_empty() {
            return Err("Price record requires a booking id".to_string());
        }
        if let Some((category, price)) = self.prices.iter().find(|(_, p)| **p < Decimal::ZERO) {
            return Err(format!("Negative price for {}: {}", category, price));
        }
        Ok(())
    }

    /// Build the stored record
    pub fn into_record(self, created_at: DateTime<Utc>) -> PriceRecord {
        PriceRecord {
            id: Uuid::new_v4(),
            booking_id: self.booking_id,
            timestamp: self.timestamp,
            prices: self.prices,
            created_at,
        }
    }

    /// Prices as a JSONB value
    pub fn prices_json(&self) -> Value {
        prices_to_json(&self.prices)
    }
}

/// Keep only category prices that are non-negative JSON numbers
///
/// Strings, nulls, booleans and nested values are dropped rather than coerced,
/// so a missing price stays distinguishable from a price of zero.
pub fn normalize_prices(raw: &Value) -> HashMap<String, Decimal> {
    let Value::Object(map) = raw else {
        return HashMap::new();
    };

    map.iter()
        .filter_map(|(category, value)| {
            let Value::Number(number) = value else {
                return None;
            };
            let text = number.to_string();
            let price = Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()?;
            (price >= Decimal::ZERO).then(|| (category.clone(), price))
        })
        .collect()
}

/// Serialize prices as JSON numbers for JSONB storage
pub fn prices_to_json(prices: &HashMap<String, Decimal>) -> Value {
    let map = prices
        .iter()
        .filter_map(|(category, price)| {
            serde_json::Number::from_str(&price.normalize().to_string())
                .ok()
                .map(|n| (category.clone(), Value::Number(n)))
        })
        .collect();
    Value::Object(map)
}

fn serialize_prices<S>(prices: &HashMap<String, Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    prices_to_json(prices).serialize(serializer)
}

fn deserialize_prices<'de, D>(deserializer: D) -> Result<HashMap<String, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(normalize_prices(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_drops_invalid_prices() {
        let raw = json!({
            "Economy Car": 300,
            "Compact Car": 312.45,
            "Standard Car": "250",
            "Premium Car": null,
            "Minivan": -5,
            "Full-size SUV": {"amount": 900},
            "Standard SUV": 4.2e2
        });

        let prices = normalize_prices(&raw);

        assert_eq!(prices.len(), 3);
        assert_eq!(prices["Economy Car"], Decimal::new(300, 0));
        assert_eq!(prices["Compact Car"], Decimal::new(31245, 2));
        assert_eq!(prices["Standard SUV"], Decimal::new(420, 0));
        assert!(!prices.contains_key("Standard Car"));
        assert!(!prices.contains_key("Minivan"));
    }

    #[test]
    fn test_normalize_non_object_is_empty() {
        assert!(normalize_prices(&json!([1, 2, 3])).is_empty());
        assert!(normalize_prices(&Value::Null).is_empty());
    }

    #[test]
    fn test_deserialize_record_normalizes_prices() {
        let record: PriceRecord = serde_json::from_value(json!({
            "id": "7f1c1b7e-4f7c-4c53-9a43-5f7e0c1d2a10",
            "booking_id": "KOA_04012025_04082025_EconomyCar",
            "timestamp": "2025-03-01T10:00:00Z",
            "prices": {"Economy Car": 275.5, "Compact Car": "n/a"},
            "created_at": "2025-03-01T10:00:05Z"
        }))
        .unwrap();

        assert_eq!(record.price_for("Economy Car"), Some(Decimal::new(2755, 1)));
        assert_eq!(record.price_for("Compact Car"), None);
    }

    #[test]
    fn test_prices_json_round_trips_through_normalize() {
        let mut prices = HashMap::new();
        prices.insert("Economy Car".to_string(), Decimal::new(25000, 2));
        let record = NewPriceRecord::new("b1", Utc::now(), prices);

        let stored = record.prices_json();
        assert_eq!(stored, json!({"Economy Car": 250}));
        assert_eq!(normalize_prices(&stored)["Economy Car"], Decimal::new(250, 0));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut prices = HashMap::new();
        prices.insert("Economy Car".to_string(), Decimal::new(-1, 0));
        assert!(NewPriceRecord::new("b1", Utc::now(), prices).validate().is_err());
    }
}
