//! In-process backend.

use super::{check_key, check_size, RecordStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps values in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    max_value_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store without a size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects values over `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            values: RwLock::default(),
            max_value_bytes: Some(limit),
        }
    }

    /// Number of keys written so far.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        check_key(key)?;
        check_size(key, &value, self.max_value_bytes)?;
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("vehicles").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store.set("vehicles", "[]".into()).await.unwrap();
        store.set("vehicles", "[1]".into()).await.unwrap();

        assert_eq!(store.get("vehicles").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn quota_failure_keeps_previous_value() {
        let store = MemoryStore::with_limit(8);
        store.set("products", "[1,2]".into()).await.unwrap();

        let result = store.set("products", "[1,2,3,4,5]".into()).await;
        assert!(matches!(result, Err(StoreError::QuotaExceeded { .. })));
        assert_eq!(store.get("products").await.unwrap().as_deref(), Some("[1,2]"));
    }
}
