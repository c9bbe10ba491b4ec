//! Persistent storage for items and their schedule states.

pub mod db;

pub use db::SqliteStore;

use crate::error::Result;
use crate::models::{Grade, ReviewOutcome, ScheduleState};
use chrono::{DateTime, Utc};

/// What the review host needs from a store.
///
/// Writes must be atomic per item. Errors from the backing storage come back
/// as `ReviewError::PersistenceFailure`; a missing item as `UnknownItem`.
pub trait StateStore {
    fn load_state(&self, item_id: i64) -> Result<ScheduleState>;

    fn save_state(&self, state: &ScheduleState) -> Result<()>;

    fn load_all_states(&self) -> Result<Vec<ScheduleState>>;

    fn record_review(&self, item_id: i64, grade: Grade, reviewed_at: DateTime<Utc>) -> Result<()>;

    /// Number of reviews logged in `[start, end)`.
    fn reviews_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<usize>;

    /// Persists a review outcome together with its log entry. The state
    /// update and the log row land together or not at all.
    fn commit_review(&self, outcome: &ReviewOutcome) -> Result<()>;
}
