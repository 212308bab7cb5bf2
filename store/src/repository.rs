//! Repository - typed access to the persisted collections.
//!
//! The repository owns the load → mutate → persist cycle. Every write
//! re-serializes the whole collection, so writes to one key are funnelled
//! through a per-key lock: two appends started back to back both land, in the
//! order they acquired the lock. Reads take no lock and see either the old or
//! the new blob.

use crate::backend::RecordStore;
use crate::error::Result;
use crate::stored::StoredCollection;
use chrono::Utc;
use dashmap::DashMap;
use garage_engine::{
    sales_report, stock_summary, Collection, CollectionKey, IdClock, Identified, PartSaleDraft,
    Product, ProductDraft, RecordId, SalesReport, StockSummary, Timestamp, Vehicle, VehicleDraft,
    VehiclePart,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Typed access to the collections in a [`RecordStore`].
pub struct Repository<S> {
    store: S,
    /// One writer at a time per storage key.
    write_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    ids: Mutex<IdClock>,
}

impl<S: RecordStore> Repository<S> {
    /// Create a repository over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_locks: DashMap::new(),
            ids: Mutex::new(IdClock::new()),
        }
    }

    /// The underlying backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Generic collection access
    // ========================================================================

    /// Load a collection, failing on storage errors or a blob that is not a
    /// JSON array.
    ///
    /// A key that was never written, or holds JSON `null`, is an empty
    /// collection. Elements that do not decode are logged and skipped.
    pub async fn try_load_collection<T>(&self, key: &CollectionKey) -> Result<Collection<T>>
    where
        T: DeserializeOwned,
    {
        Ok(self.load_stored::<T>(key).await?.into_collection())
    }

    /// Load a collection, treating any failure as "no data".
    pub async fn load_collection<T>(&self, key: &CollectionKey) -> Vec<T>
    where
        T: DeserializeOwned,
    {
        match self.try_load_collection(key).await {
            Ok(collection) => collection.into_vec(),
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "failed to load collection, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Append `record` to the collection at `key` and persist it.
    ///
    /// Fails without writing if the stored blob is not a JSON array, so an
    /// unreadable blob is never replaced by a one-element collection.
    /// Individual elements that do not decode are written back unchanged.
    pub async fn append_and_persist<T>(&self, key: &CollectionKey, record: T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.modify(key, move |stored: &mut StoredCollection<T>| {
            stored.append(record);
            Ok(((), true))
        })
        .await
    }

    /// Remove every record matching `predicate` and persist the rest.
    ///
    /// Returns how many records were removed. Removing nothing does not
    /// write.
    pub async fn remove_and_persist<T, F>(&self, key: &CollectionKey, predicate: F) -> Result<usize>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnMut(&T) -> bool + Send,
    {
        self.modify(key, move |stored: &mut StoredCollection<T>| {
            let removed = stored.remove_where(predicate);
            Ok((removed, removed > 0))
        })
        .await
    }

    async fn load_stored<T>(&self, key: &CollectionKey) -> Result<StoredCollection<T>>
    where
        T: DeserializeOwned,
    {
        let key = key.as_key();
        match self.store.get(&key).await? {
            Some(raw) => StoredCollection::decode(&key, &raw),
            None => Ok(StoredCollection::default()),
        }
    }

    /// Run `mutate` on the freshly loaded collection while holding the key's
    /// write lock, then persist if it reports a change.
    async fn modify<T, R, F>(&self, key: &CollectionKey, mutate: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(&mut StoredCollection<T>) -> Result<(R, bool)> + Send,
    {
        let storage_key = key.as_key();
        let lock = self.write_lock(&storage_key);
        let _guard = lock.lock().await;

        let mut stored = self.load_stored::<T>(key).await?;
        let (output, changed) = mutate(&mut stored)?;

        if changed {
            let raw = stored.encode(&storage_key)?;
            self.store.set(&storage_key, raw).await?;
            tracing::debug!(
                key = %storage_key,
                len = stored.len(),
                unreadable = stored.unreadable(),
                "persisted collection"
            );
        }

        Ok(output)
    }

    fn write_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.write_locks.entry(key.to_string()).or_default().clone()
    }

    /// Allocate an id after every id already in `stored`.
    fn allocate_id<T: Identified>(&self, stored: &StoredCollection<T>) -> (RecordId, Timestamp) {
        let now = now_millis();
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(max) = stored.max_id() {
            ids.observe(max);
        }
        (ids.next_id(now), now)
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// The product catalog.
    pub async fn products(&self) -> Vec<Product> {
        self.load_collection(&CollectionKey::Products).await
    }

    /// Validate `draft` and add it to the catalog.
    pub async fn add_product(&self, draft: ProductDraft) -> Result<Product> {
        self.add_product_to(CollectionKey::Products, draft).await
    }

    /// Remove a catalog product. Returns whether it was present.
    pub async fn remove_product(&self, id: RecordId) -> Result<bool> {
        self.remove_by_id::<Product>(CollectionKey::Products, id)
            .await
    }

    /// Products in stock.
    pub async fn stock(&self) -> Vec<Product> {
        self.load_collection(&CollectionKey::ProductStock).await
    }

    /// Validate `draft` and add it to stock.
    pub async fn add_stock_product(&self, draft: ProductDraft) -> Result<Product> {
        self.add_product_to(CollectionKey::ProductStock, draft).await
    }

    /// Remove a product from stock. Returns whether it was present.
    pub async fn remove_stock_product(&self, id: RecordId) -> Result<bool> {
        self.remove_by_id::<Product>(CollectionKey::ProductStock, id)
            .await
    }

    async fn add_product_to(&self, key: CollectionKey, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;

        let product = self
            .modify(&key, |stored: &mut StoredCollection<Product>| {
                let (id, now) = self.allocate_id(stored);
                let product = draft.into_product(id, now)?;
                stored.append(product.clone());
                Ok((product, true))
            })
            .await?;

        tracing::info!(key = %key, id = %product.id, "added product");
        Ok(product)
    }

    async fn remove_by_id<T>(&self, key: CollectionKey, id: RecordId) -> Result<bool>
    where
        T: Identified + Serialize + DeserializeOwned + Send,
    {
        let removed = self
            .modify(&key, |stored: &mut StoredCollection<T>| {
                let removed = stored.remove_id(id);
                Ok((removed, removed > 0))
            })
            .await?;

        tracing::info!(key = %key, id = %id, removed, "removed record");
        Ok(removed > 0)
    }

    // ========================================================================
    // Vehicles
    // ========================================================================

    /// Vehicles in the order they were added.
    pub async fn vehicles(&self) -> Vec<Vehicle> {
        self.load_collection(&CollectionKey::Vehicles).await
    }

    /// Look up one vehicle.
    pub async fn vehicle(&self, id: RecordId) -> Option<Vehicle> {
        self.vehicles().await.into_iter().find(|v| v.id == id)
    }

    /// Validate `draft` and add the vehicle.
    pub async fn add_vehicle(&self, draft: VehicleDraft) -> Result<Vehicle> {
        draft.validate()?;

        let vehicle = self
            .modify(
                &CollectionKey::Vehicles,
                |stored: &mut StoredCollection<Vehicle>| {
                    let (id, now) = self.allocate_id(stored);
                    let vehicle = draft.into_vehicle(id, now)?;
                    stored.append(vehicle.clone());
                    Ok((vehicle, true))
                },
            )
            .await?;

        tracing::info!(id = %vehicle.id, "added vehicle");
        Ok(vehicle)
    }

    /// Parts sold for one vehicle.
    pub async fn vehicle_parts(&self, vehicle_id: RecordId) -> Vec<VehiclePart> {
        self.load_collection(&CollectionKey::VehicleParts(vehicle_id))
            .await
    }

    /// Validate `draft` and record it as sold for `vehicle_id`.
    pub async fn record_part_sale(
        &self,
        vehicle_id: RecordId,
        draft: PartSaleDraft,
    ) -> Result<VehiclePart> {
        draft.validate()?;

        let vehicles: Collection<Vehicle> =
            self.try_load_collection(&CollectionKey::Vehicles).await?;
        if vehicles.get(vehicle_id).is_none() {
            return Err(garage_engine::Error::UnknownVehicle(vehicle_id).into());
        }

        let key = CollectionKey::VehicleParts(vehicle_id);
        let part = self
            .modify(&key, |stored: &mut StoredCollection<VehiclePart>| {
                let (id, now) = self.allocate_id(stored);
                let part = draft.into_part(id, now)?;
                stored.append(part.clone());
                Ok((part, true))
            })
            .await?;

        tracing::info!(key = %key, id = %part.id, "recorded part sale");
        Ok(part)
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Stock totals and the most recently added vehicle.
    pub async fn compute_stock_summary(&self) -> StockSummary {
        let stock = self.stock().await;
        let vehicles = self.vehicles().await;
        stock_summary(&stock, &vehicles)
    }

    /// Every part sold, newest first, with the grand total.
    pub async fn compute_sales_report(&self) -> SalesReport {
        let vehicles = self.vehicles().await;

        let mut sales = Vec::with_capacity(vehicles.len());
        for vehicle in &vehicles {
            let parts = self.vehicle_parts(vehicle.id).await;
            sales.push((vehicle, parts));
        }

        let report = sales_report(sales);
        tracing::debug!(rows = report.rows.len(), "computed sales report");
        report
    }
}

fn now_millis() -> Timestamp {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
