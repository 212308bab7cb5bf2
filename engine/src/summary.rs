//! Stock summary shown on the home screen.

use crate::{Product, Vehicle};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Totals over the stock collection plus the latest vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    /// Sum of quantities in stock
    pub total_products: u64,
    /// Sum of price times quantity, unrounded, saturating at `Decimal::MAX`
    pub total_earnings: Decimal,
    /// Last vehicle in insertion order
    pub recent_vehicle: Option<Vehicle>,
}

/// Summarize stock on hand and the vehicle list.
///
/// `recent_vehicle` is the last element of `vehicles`: "most recent" means
/// most recently appended, regardless of `date_added`.
pub fn stock_summary(stock: &[Product], vehicles: &[Vehicle]) -> StockSummary {
    StockSummary {
        total_products: stock.iter().map(|p| u64::from(p.quantity)).sum(),
        total_earnings: stock
            .iter()
            .map(Product::value)
            .fold(Decimal::ZERO, Decimal::saturating_add),
        recent_vehicle: vehicles.last().cloned(),
    }
}
