//! # Garage Engine
//!
//! Domain logic for a repair shop's parts inventory, vehicles under service,
//! and sales.
//!
//! This crate defines the records the app stores, validates form input, and
//! computes the derived views (stock summary, sales report). It never touches
//! storage; `garage-store` loads and persists collections and calls in here.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of files, storage, or platform
//! - **Deterministic**: Functions that need the current time take it as input
//! - **Append-or-remove**: Collections change only by whole-record appends and removals
//!
//! ## Core Concepts
//!
//! ### Collections
//!
//! Records live in named, ordered [`Collection`]s addressed by a
//! [`CollectionKey`]:
//! - `products` and `productStock` hold [`Product`]s
//! - `vehicles` holds [`Vehicle`]s
//! - `vehicle_parts_<vehicleId>` holds the [`VehiclePart`]s sold for one vehicle
//!
//! ### Ids
//!
//! Ids are allocated by an [`IdClock`] from the creation instant and are
//! strictly increasing, so a higher id always means a later record.
//!
//! ### Drafts
//!
//! Form input arrives as text in a [`ProductDraft`], [`VehicleDraft`] or
//! [`PartSaleDraft`]. Validation is the only error a user ever sees.
//!
//! ## Quick Start
//!
//! ```rust
//! use garage_engine::{stock_summary, IdClock, ProductDraft};
//!
//! let mut clock = IdClock::new();
//! let now = 1706745600000;
//!
//! let draft = ProductDraft {
//!     name: "Brake pad".into(),
//!     price: "450.00".into(),
//!     quantity: "4".into(),
//!     ..Default::default()
//! };
//! let product = draft.into_product(clock.next_id(now), now).unwrap();
//!
//! let summary = stock_summary(&[product], &[]);
//! assert_eq!(summary.total_products, 4);
//! assert_eq!(summary.total_earnings.to_string(), "1800.00");
//! ```

pub mod clock;
pub mod collection;
pub mod draft;
pub mod error;
pub mod record;
pub mod report;
pub mod summary;

// Re-export main types at crate root
pub use clock::IdClock;
pub use collection::{Collection, CollectionKey};
pub use draft::{PartSaleDraft, ProductDraft, VehicleDraft};
pub use error::Error;
pub use record::{Identified, Product, RecordId, Vehicle, VehiclePart};
pub use report::{sales_report, total_sales, SaleRow, SalesReport, SALE_DATE_FORMAT};
pub use summary::{stock_summary, StockSummary};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;
