//! Stored collections decoded one element at a time.
//!
//! Older app versions wrote form input straight into the blob, so a single
//! element can fail to decode (`"price": "Rs 99"`) while its neighbours are
//! fine. Such elements are skipped on read and written back verbatim, in
//! their original position, whenever the collection is rewritten.

use crate::error::{Result, StoreError};
use garage_engine::{Collection, Identified, RecordId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// One element of a stored array.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Slot<T> {
    Record(T),
    Unreadable(Value),
}

impl<T> Slot<T> {
    fn record(&self) -> Option<&T> {
        match self {
            Slot::Record(record) => Some(record),
            Slot::Unreadable(_) => None,
        }
    }
}

/// The raw `id` of an element that did not decode.
fn raw_id(value: &Value) -> Option<RecordId> {
    value.get("id").and_then(Value::as_u64).map(RecordId::new)
}

/// A collection as it sits in storage, unreadable elements included.
#[derive(Debug)]
pub(crate) struct StoredCollection<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for StoredCollection<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: DeserializeOwned> StoredCollection<T> {
    /// Decode the blob stored under `key`.
    ///
    /// JSON `null` is an empty collection. Anything that is not a JSON array
    /// fails with [`StoreError::Serialization`].
    pub(crate) fn decode(key: &str, raw: &str) -> Result<Self> {
        let values = serde_json::from_str::<Option<Vec<Value>>>(raw).map_err(|source| {
            StoreError::Serialization {
                key: key.to_string(),
                source,
            }
        })?;

        let slots = values
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, value)| match T::deserialize(&value) {
                Ok(record) => Slot::Record(record),
                Err(e) => {
                    tracing::warn!(key, index, error = %e, "skipping unreadable record");
                    Slot::Unreadable(value)
                }
            })
            .collect();

        Ok(Self { slots })
    }
}

impl<T: Serialize> StoredCollection<T> {
    pub(crate) fn encode(&self, key: &str) -> Result<String> {
        serde_json::to_string(&self.slots).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })
    }
}

impl<T> StoredCollection<T> {
    pub(crate) fn append(&mut self, record: T) {
        self.slots.push(Slot::Record(record));
    }

    /// Remove every readable record matching `predicate`.
    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.slots.len();
        self.slots.retain(|slot| !slot.record().is_some_and(&mut predicate));
        before - self.slots.len()
    }

    /// Number of stored elements, unreadable ones included.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn unreadable(&self) -> usize {
        self.slots.iter().filter(|s| s.record().is_none()).count()
    }

    /// The readable records, in stored order.
    pub(crate) fn into_collection(self) -> Collection<T> {
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Record(record) => Some(record),
                Slot::Unreadable(_) => None,
            })
            .collect()
    }
}

impl<T: Identified> StoredCollection<T> {
    /// Highest id stored, counting unreadable elements that carry one.
    pub(crate) fn max_id(&self) -> Option<RecordId> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Record(record) => Some(record.id()),
                Slot::Unreadable(value) => raw_id(value),
            })
            .max()
    }

    /// Remove the element with `id`, whether or not it decoded.
    pub(crate) fn remove_id(&mut self, id: RecordId) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| match slot {
            Slot::Record(record) => record.id() != id,
            Slot::Unreadable(value) => raw_id(value) != Some(id),
        });
        before - self.slots.len()
    }
}
