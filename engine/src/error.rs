//! Error types for the garage engine.
//!
//! Every engine error is a validation failure: the engine performs no IO, so
//! anything that goes wrong here is a problem with the input handed to it.

use crate::RecordId;
use thiserror::Error;

/// All possible errors from the garage engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("invalid number for field '{field}': {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("value out of range for field '{field}': {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },

    #[error("unknown collection key: {0}")]
    InvalidCollectionKey(String),

    #[error("no vehicle with id {0}")]
    UnknownVehicle(RecordId),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
