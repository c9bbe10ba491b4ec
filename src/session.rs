//! Review session management.
//! Snapshots the deck, builds today's capped queue, and walks it one grade
//! at a time, persisting each outcome before moving on.

use crate::clock::ClockSource;
use crate::database::StateStore;
use crate::error::Result;
use crate::models::{ProgressEvent, RawGrade, ReviewOutcome, ReviewSubmission};
use crate::scheduling::{DailyLimiter, ReviewQueueBuilder, ReviewScheduler};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Start and end of the UTC day containing `now`.
pub fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

/// Reviews already logged on the UTC day containing `now`.
pub fn reviews_done_today<S: StateStore>(store: &S, now: DateTime<Utc>) -> Result<usize> {
    let (start, end) = day_bounds(now);
    store.reviews_between(start, end)
}

/// Load, grade and persist a single item. The caller holds the store
/// exclusively for the duration of the call.
pub fn review_item<S: StateStore, C: ClockSource>(
    store: &S,
    scheduler: &ReviewScheduler<C>,
    submission: &ReviewSubmission,
) -> Result<ReviewOutcome> {
    let current = store.load_state(submission.item_id)?;
    let outcome = scheduler.submit_review(&current, submission)?;
    store.commit_review(&outcome)?;
    Ok(outcome)
}

/// Walks a fixed queue of due items. The queue is computed once at start so
/// its order doesn't shift mid-session.
pub struct ReviewSession<S: StateStore, C: ClockSource> {
    store: Arc<Mutex<S>>,
    scheduler: ReviewScheduler<C>,
    queue: Vec<i64>,
    current_index: usize,
    events: Vec<ProgressEvent>,
}

impl<S: StateStore, C: ClockSource> ReviewSession<S, C> {
    /// Creates a session from the items due now, limited by today's quota.
    pub fn start(store: Arc<Mutex<S>>, scheduler: ReviewScheduler<C>) -> Result<Self> {
        let now = scheduler.now();
        let queue = {
            let store = store.lock().unwrap_or_else(|e| e.into_inner());
            let snapshot = store.load_all_states()?;
            let done_today = reviews_done_today(&*store, now)?;
            let limiter = DailyLimiter::new(scheduler.config().daily_review_cap);
            ReviewQueueBuilder::new(limiter).todays_queue(&snapshot, now, done_today)
        };

        info!(due = queue.len(), "Review session started");

        Ok(Self {
            store,
            scheduler,
            queue,
            current_index: 0,
            events: Vec::new(),
        })
    }

    pub fn queue(&self) -> &[i64] {
        &self.queue
    }

    pub fn current_item_id(&self) -> Option<i64> {
        self.queue.get(self.current_index).copied()
    }

    /// Grades the current item and moves to the next one.
    ///
    /// Returns `Ok(None)` once the queue is exhausted. A rejected grade leaves
    /// both the cursor and the stored state untouched.
    pub fn grade_current(&mut self, raw: impl Into<RawGrade>) -> Result<Option<ReviewOutcome>> {
        let Some(item_id) = self.current_item_id() else {
            return Ok(None);
        };

        let submission = ReviewSubmission::new(item_id, raw).at(self.scheduler.now());
        let outcome = {
            let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
            review_item(&*store, &self.scheduler, &submission)?
        };

        self.events.push(outcome.progress_event());
        self.current_index += 1;
        Ok(Some(outcome))
    }

    /// Progress events for the gamification layer, in review order.
    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn reviewed_count(&self) -> usize {
        self.current_index
    }

    pub fn total_count(&self) -> usize {
        self.queue.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.reviewed_count()
    }

    pub fn is_completed(&self) -> bool {
        self.current_index >= self.queue.len()
    }

    pub fn progress_message(&self) -> String {
        format!(
            "Reviewed {} of {} ({} remaining)",
            self.reviewed_count(),
            self.total_count(),
            self.remaining_count()
        )
    }
}
