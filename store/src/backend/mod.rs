//! Key/value backends the repository persists collections into.
//!
//! A backend maps a string key to a JSON-encoded string. `set` replaces the
//! whole value; a failed `set` leaves the previous value in place.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable mapping from key to JSON text.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The value stored under `key`, or `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value).await
    }
}

/// Keys double as file names, so they are restricted to `[A-Za-z0-9_-]`.
pub(crate) fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

pub(crate) fn check_size(key: &str, value: &str, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if value.len() > limit => Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            size: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_collection_keys() {
        for key in ["products", "productStock", "vehicles", "vehicle_parts_1706745600000"] {
            assert!(check_key(key).is_ok(), "rejected {key}");
        }
    }

    #[test]
    fn rejects_path_like_keys() {
        for key in ["", "../vehicles", "a/b", "a.json", "with space", "ümlaut"] {
            assert!(
                matches!(check_key(key), Err(StoreError::InvalidKey(_))),
                "accepted {key:?}"
            );
        }
    }

    #[test]
    fn size_limit() {
        assert!(check_size("k", "1234", Some(4)).is_ok());
        assert!(check_size("k", "12345", None).is_ok());
        assert!(matches!(
            check_size("k", "12345", Some(4)),
            Err(StoreError::QuotaExceeded {
                size: 5,
                limit: 4,
                ..
            })
        ));
    }
}
