//! Error values produced by the analytics core.
//!
//! The core only tags failures; turning them into exit codes or response
//! envelopes is left to whoever calls it.

use chrono::NaiveDateTime;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum TrafficError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("traffic data already exists for timestamp: {0}")]
    DuplicateTimestamp(NaiveDateTime),

    #[error("invalid line format: {line} ({reason})")]
    MalformedLine { line: String, reason: String },

    #[error("insufficient historical data for prediction between {from} and {to}")]
    InsufficientHistory {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    #[error("record store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for TrafficError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(ts) => TrafficError::DuplicateTimestamp(ts),
            other => TrafficError::StoreUnavailable(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrafficError>;
