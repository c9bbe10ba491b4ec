//! Per-item scheduling record owned by the review engine.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub item_id: i64,
    pub ease_factor: f64,
    /// 0 while in the learning phase.
    pub interval_days: u32,
    /// Consecutive passing reviews since the last lapse.
    pub repetitions: u32,
    /// Index into the learning step sequence. Only meaningful before graduation.
    pub learning_step: u32,
    pub is_graduated: bool,
    /// `None` until the first accepted review.
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub mastery_level: u8,
}

impl ScheduleState {
    /// State for an item entering the deck at `added_at`. Due immediately.
    pub fn new(item_id: i64, initial_ease_factor: f64, added_at: DateTime<Utc>) -> Self {
        Self {
            item_id,
            ease_factor: initial_ease_factor,
            interval_days: 0,
            repetitions: 0,
            learning_step: 0,
            is_graduated: false,
            last_reviewed_at: None,
            next_review_at: added_at,
            mastery_level: 0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    pub fn has_been_reviewed(&self) -> bool {
        self.last_reviewed_at.is_some()
    }
}
