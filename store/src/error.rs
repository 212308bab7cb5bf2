//! Unified error handling for the record store.

use std::io;

/// Record store error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read '{key}': {source}")]
    StorageRead {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{key}': {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("value for '{key}' is {size} bytes, over the {limit} byte limit")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("failed to (de)serialize '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error(transparent)]
    Validation(#[from] garage_engine::Error),
}

impl StoreError {
    /// Short machine-readable category, used across the C ABI.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::StorageRead { .. } | StoreError::StorageWrite { .. } => "storage",
            StoreError::QuotaExceeded { .. } => "quota",
            StoreError::Serialization { .. } => "serialization",
            StoreError::InvalidKey(_) | StoreError::Validation(_) => "validation",
        }
    }

    /// Whether the user caused this error and can fix it.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
