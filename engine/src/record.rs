//! Record types stored in collections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque record identity.
///
/// Ids are allocated from the creation instant (see [`crate::IdClock`]) and
/// serialize as a bare JSON integer, matching what older app versions wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Interpret the id as milliseconds since the Unix epoch.
    ///
    /// Only meaningful for records that carry no explicit timestamp.
    pub fn as_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Records addressable by id inside a collection.
pub trait Identified {
    fn id(&self) -> RecordId;
}

/// A product in the catalog or in stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(deserialize_with = "lenient_quantity")]
    pub quantity: u32,
    pub date_added: DateTime<Utc>,
}

impl Product {
    /// Stock value of this line: price times quantity.
    ///
    /// Saturates at [`Decimal::MAX`]; stored records are not re-validated.
    pub fn value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

impl Identified for Product {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// A vehicle brought in for service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: RecordId,
    pub make: String,
    pub model: String,
    pub registration_number: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub contact_number: String,
    pub date_added: DateTime<Utc>,
}

impl Identified for Vehicle {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// A part sold while servicing a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePart {
    pub id: RecordId,
    pub name: String,
    pub price: Decimal,
    #[serde(deserialize_with = "lenient_quantity")]
    pub quantity: u32,
    pub total_cost: Decimal,
    /// Missing on parts written before sale times were recorded separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_at: Option<DateTime<Utc>>,
}

impl VehiclePart {
    /// When the part was sold, falling back to the id for older records.
    pub fn sale_time(&self) -> Option<DateTime<Utc>> {
        self.sold_at.or_else(|| self.id.as_datetime())
    }
}

impl Identified for VehiclePart {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Accepts a quantity written either as a JSON integer or as the raw text of
/// the form field it came from.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid quantity {text:?}"))),
    }
}
