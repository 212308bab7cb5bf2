//! Sales report: every part sold, joined with the vehicle it was sold for.

use crate::{Vehicle, VehiclePart};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Format of the human-readable sale date, e.g. `5/2/2024`.
pub const SALE_DATE_FORMAT: &str = "%-d/%-m/%Y";

/// One row of the sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRow {
    pub vehicle_make: String,
    pub vehicle_model: String,
    #[serde(flatten)]
    pub part: VehiclePart,
    /// Sale date in UTC, empty when the sale time is not representable
    pub date: String,
}

impl SaleRow {
    fn new(vehicle: &Vehicle, part: VehiclePart) -> Self {
        let date = part
            .sale_time()
            .map(|t| t.format(SALE_DATE_FORMAT).to_string())
            .unwrap_or_default();

        Self {
            vehicle_make: vehicle.make.clone(),
            vehicle_model: vehicle.model.clone(),
            part,
            date,
        }
    }
}

/// All sales, newest first, with their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub rows: Vec<SaleRow>,
    pub total_sales: Decimal,
}

impl SalesReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build the sales report from each vehicle and its parts.
///
/// Rows are ordered by descending part id. The sort is stable, so parts with
/// equal ids keep the order they were visited in.
pub fn sales_report<'a, I>(sales: I) -> SalesReport
where
    I: IntoIterator<Item = (&'a Vehicle, Vec<VehiclePart>)>,
{
    let mut rows: Vec<SaleRow> = sales
        .into_iter()
        .flat_map(|(vehicle, parts)| parts.into_iter().map(move |p| SaleRow::new(vehicle, p)))
        .collect();

    rows.sort_by(|a, b| b.part.id.cmp(&a.part.id));

    SalesReport {
        total_sales: total_sales(&rows),
        rows,
    }
}

/// Sum of `totalCost` over `rows`; zero when empty. Saturates at
/// [`Decimal::MAX`].
pub fn total_sales(rows: &[SaleRow]) -> Decimal {
    rows.iter()
        .map(|r| r.part.total_cost)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}
