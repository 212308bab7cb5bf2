//! # Garage Store
//!
//! Local persistence for the garage inventory app.
//!
//! Each collection is a JSON array stored under one key in a
//! [`RecordStore`]. The [`Repository`] loads a collection, applies an append
//! or removal, and writes the whole collection back. Aggregations read the
//! latest persisted state and never write.
//!
//! ## Backends
//!
//! - [`FileStore`]: one `<key>.json` file per collection, replaced atomically
//! - [`MemoryStore`]: in-process, for tests and previews
//!
//! ## Failure model
//!
//! - Loads degrade: a missing or unreadable collection is logged and read as
//!   empty.
//! - Writes propagate: validation, storage and quota failures come back as
//!   [`StoreError`] and leave the stored collection as it was.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use garage_store::{FileStore, Repository};
//! use garage_engine::VehicleDraft;
//!
//! # async fn run() -> garage_store::Result<()> {
//! let store = FileStore::open("./garage-data", None).await?;
//! let repo = Repository::new(store);
//!
//! let vehicle = repo
//!     .add_vehicle(VehicleDraft {
//!         make: "Maruti".into(),
//!         model: "Swift".into(),
//!         registration_number: "KA01AB1234".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let summary = repo.compute_stock_summary().await;
//! assert_eq!(summary.recent_vehicle, Some(vehicle));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod ffi;
pub mod repository;
mod stored;
pub mod telemetry;

pub use backend::{FileStore, MemoryStore, RecordStore};
pub use config::{Config, ConfigError};
pub use error::{Result, StoreError};
pub use repository::Repository;
pub use telemetry::init_tracing;
