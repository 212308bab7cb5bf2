//! Form drafts and their validation.
//!
//! A draft holds the raw text of an add-form exactly as typed. Validation runs
//! before anything touches storage and turns a draft into a typed record, or
//! fails with the first offending field.

use crate::{error::Result, Error, Product, RecordId, Timestamp, Vehicle, VehiclePart};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw input of the add-product form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: String,
    pub quantity: String,
}

/// Raw input of the add-vehicle form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleDraft {
    pub make: String,
    pub model: String,
    pub registration_number: String,
    pub customer_name: String,
    pub contact_number: String,
}

/// Raw input for a part sold against a vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartSaleDraft {
    pub name: String,
    pub price: String,
    pub quantity: String,
}

impl ProductDraft {
    /// Check required fields and numbers without building a record.
    pub fn validate(&self) -> Result<()> {
        required("name", &self.name)?;
        let price = price("price", &self.price)?;
        let quantity = quantity("quantity", &self.quantity, 0)?;
        line_total(price, quantity, "stock value overflows")?;
        Ok(())
    }

    /// Validate and build the product.
    pub fn into_product(self, id: RecordId, now: Timestamp) -> Result<Product> {
        let name = required("name", &self.name)?.to_string();
        let price = price("price", &self.price)?;
        let quantity = quantity("quantity", &self.quantity, 0)?;
        line_total(price, quantity, "stock value overflows")?;

        Ok(Product {
            id,
            name,
            description: self.description.trim().to_string(),
            price,
            quantity,
            date_added: datetime(now),
        })
    }
}

impl VehicleDraft {
    pub fn validate(&self) -> Result<()> {
        required("make", &self.make)?;
        required("model", &self.model)?;
        required("registrationNumber", &self.registration_number)?;
        Ok(())
    }

    pub fn into_vehicle(self, id: RecordId, now: Timestamp) -> Result<Vehicle> {
        self.validate()?;

        Ok(Vehicle {
            id,
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            registration_number: self.registration_number.trim().to_string(),
            customer_name: self.customer_name.trim().to_string(),
            contact_number: self.contact_number.trim().to_string(),
            date_added: datetime(now),
        })
    }
}

impl PartSaleDraft {
    pub fn validate(&self) -> Result<()> {
        required("name", &self.name)?;
        let price = price("price", &self.price)?;
        let quantity = quantity("quantity", &self.quantity, 1)?;
        line_total(price, quantity, "total cost overflows")?;
        Ok(())
    }

    /// Validate and build the sale line. `totalCost` is price times quantity.
    pub fn into_part(self, id: RecordId, now: Timestamp) -> Result<VehiclePart> {
        let name = required("name", &self.name)?.to_string();
        let price = price("price", &self.price)?;
        let quantity = quantity("quantity", &self.quantity, 1)?;
        let total_cost = line_total(price, quantity, "total cost overflows")?;

        Ok(VehiclePart {
            id,
            name,
            price,
            quantity,
            total_cost,
            sold_at: Some(datetime(now)),
        })
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingRequiredField(field));
    }
    Ok(trimmed)
}

fn price(field: &'static str, value: &str) -> Result<Decimal> {
    let text = required(field, value)?;
    let amount = Decimal::from_str(text).map_err(|_| Error::InvalidNumber {
        field,
        value: text.to_string(),
    })?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::OutOfRange {
            field,
            reason: "must not be negative",
        });
    }
    Ok(amount)
}

fn quantity(field: &'static str, value: &str, min: u32) -> Result<u32> {
    let text = required(field, value)?;
    let count: i64 = text.parse().map_err(|_| Error::InvalidNumber {
        field,
        value: text.to_string(),
    })?;

    if count < i64::from(min) {
        return Err(Error::OutOfRange {
            field,
            reason: if min == 0 {
                "must not be negative"
            } else {
                "must be at least one"
            },
        });
    }

    u32::try_from(count).map_err(|_| Error::OutOfRange {
        field,
        reason: "too large",
    })
}

fn line_total(price: Decimal, quantity: u32, reason: &'static str) -> Result<Decimal> {
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or(Error::OutOfRange {
            field: "price",
            reason,
        })
}

// Millisecond timestamps past year 262143 are not representable; clamp
// rather than fail since `now` comes from the system clock.
fn datetime(now: Timestamp) -> DateTime<Utc> {
    i64::try_from(now)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
