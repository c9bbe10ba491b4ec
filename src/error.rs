//! Error types shared by the scheduling engine and its host-side store.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced to the host when a review cannot be recorded.
///
/// Every variant is recoverable: the prior `ScheduleState` stays authoritative.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid grade: {0:?} (expected again/hard/good/easy or 1-4)")]
    InvalidGrade(String),

    #[error(
        "Stale submission for item {item_id}: submitted at {submitted_at}, last reviewed at {last_reviewed_at}"
    )]
    StaleSubmission {
        item_id: i64,
        submitted_at: DateTime<Utc>,
        last_reviewed_at: DateTime<Utc>,
    },

    #[error("Submission for item {found} applied to state of item {expected}")]
    ItemMismatch { expected: i64, found: i64 },

    #[error("Item {0} not found")]
    UnknownItem(i64),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[source] StoreError),
}

/// Errors raised by the persistent item store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        ReviewError::PersistenceFailure(err)
    }
}

impl From<rusqlite::Error> for ReviewError {
    fn from(err: rusqlite::Error) -> Self {
        ReviewError::PersistenceFailure(StoreError::Database(err))
    }
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
