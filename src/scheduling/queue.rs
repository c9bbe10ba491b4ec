//! Building the ordered set of items to review.

use super::DailyLimiter;
use crate::models::ScheduleState;
use chrono::{DateTime, Utc};

/// Today's queue: due items capped by what the daily limit still allows.
#[derive(Debug, Clone, Copy)]
pub struct ReviewQueueBuilder {
    limiter: DailyLimiter,
}

impl ReviewQueueBuilder {
    pub fn new(limiter: DailyLimiter) -> Self {
        Self { limiter }
    }

    pub fn todays_queue(
        &self,
        snapshot: &[ScheduleState],
        now: DateTime<Utc>,
        reviews_done_today: usize,
    ) -> Vec<i64> {
        build_queue(snapshot, now, self.limiter.remaining(reviews_done_today))
    }
}

/// Ids of items due at `now`, at most `limit` of them.
///
/// Learning-phase items come first, then ascending `next_review_at`, then
/// ascending id. Items not yet due are never included.
pub fn build_queue(all_states: &[ScheduleState], now: DateTime<Utc>, limit: usize) -> Vec<i64> {
    let mut due: Vec<&ScheduleState> = all_states.iter().filter(|s| s.is_due(now)).collect();

    due.sort_by(|a, b| {
        a.is_graduated
            .cmp(&b.is_graduated)
            .then(a.next_review_at.cmp(&b.next_review_at))
            .then(a.item_id.cmp(&b.item_id))
    });

    due.into_iter().take(limit).map(|s| s.item_id).collect()
}

/// Items that have been reviewed, weakest mastery first ("needs practice").
pub fn weakest_items(all_states: &[ScheduleState], limit: usize) -> Vec<i64> {
    let mut reviewed: Vec<&ScheduleState> = all_states
        .iter()
        .filter(|s| s.has_been_reviewed())
        .collect();

    reviewed.sort_by(|a, b| {
        a.mastery_level
            .cmp(&b.mastery_level)
            .then(a.item_id.cmp(&b.item_id))
    });

    reviewed.into_iter().take(limit).map(|s| s.item_id).collect()
}
