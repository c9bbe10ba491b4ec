//! The review scheduling engine.
//!
//! All functions here are synchronous and look only at the current
//! `ScheduleState`, never at review history.

pub mod ease;
pub mod interval;
pub mod limiter;
pub mod mastery;
pub mod queue;
pub mod scheduler;
pub mod stats;

pub use ease::next_ease_factor;
pub use interval::{PlannedInterval, plan_next_interval};
pub use limiter::{DailyLimiter, remaining_quota};
pub use mastery::update_mastery;
pub use queue::{ReviewQueueBuilder, build_queue, weakest_items};
pub use scheduler::ReviewScheduler;
pub use stats::DeckStats;
