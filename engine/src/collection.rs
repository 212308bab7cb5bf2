//! Named collections and the keys they are stored under.
//!
//! A collection is an ordered sequence of records persisted as one JSON array.
//! Membership changes only by appending or removing whole records; insertion
//! order is preserved and is meaningful (the last vehicle is the most recent).

use crate::{Error, Identified, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PRODUCTS: &str = "products";
const PRODUCT_STOCK: &str = "productStock";
const VEHICLES: &str = "vehicles";
const VEHICLE_PARTS_PREFIX: &str = "vehicle_parts_";

/// The key a collection is persisted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    /// Product catalog.
    Products,
    /// Products currently in stock.
    ProductStock,
    /// Vehicles under service, in the order they were added.
    Vehicles,
    /// Parts sold against one vehicle.
    VehicleParts(RecordId),
}

impl CollectionKey {
    /// The storage key string.
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKey::Products => f.write_str(PRODUCTS),
            CollectionKey::ProductStock => f.write_str(PRODUCT_STOCK),
            CollectionKey::Vehicles => f.write_str(VEHICLES),
            CollectionKey::VehicleParts(id) => write!(f, "{VEHICLE_PARTS_PREFIX}{id}"),
        }
    }
}

impl FromStr for CollectionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PRODUCTS => Ok(CollectionKey::Products),
            PRODUCT_STOCK => Ok(CollectionKey::ProductStock),
            VEHICLES => Ok(CollectionKey::Vehicles),
            other => other
                .strip_prefix(VEHICLE_PARTS_PREFIX)
                .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|id| id.parse().ok())
                .map(|id| CollectionKey::VehicleParts(RecordId::new(id)))
                .ok_or_else(|| Error::InvalidCollectionKey(other.to_string())),
        }
    }
}

/// An ordered collection of records.
///
/// Serializes as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    records: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record at the end.
    pub fn append(&mut self, record: T) {
        self.records.push(record);
    }

    /// Remove every record matching `predicate`, keeping the order of the
    /// rest. Returns how many were removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|r| !predicate(r));
        before - self.records.len()
    }

    /// The most recently appended record.
    pub fn last(&self) -> Option<&T> {
        self.records.last()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.records
    }
}

impl<T: Identified> Collection<T> {
    /// Get a record by id.
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Remove the record with `id`. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: RecordId) -> bool {
        self.remove_where(|r| r.id() == id) > 0
    }

    /// Highest id in the collection.
    pub fn max_id(&self) -> Option<RecordId> {
        self.records.iter().map(Identified::id).max()
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(records: Vec<T>) -> Self {
        Self { records }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
