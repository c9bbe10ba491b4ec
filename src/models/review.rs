//! Review inputs and outputs.

use super::{Grade, RawGrade, ScheduleState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A learner's answer for one item. Consumed once by the scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub item_id: i64,
    pub grade: RawGrade,
    /// Defaults to the scheduler's clock when omitted.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ReviewSubmission {
    pub fn new(item_id: i64, grade: impl Into<RawGrade>) -> Self {
        Self {
            item_id,
            grade: grade.into(),
            submitted_at: None,
        }
    }

    pub fn at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = Some(submitted_at);
        self
    }
}

/// What a single review did to the item's schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Moved forward one learning step.
    Advanced,
    /// Stayed on the same learning step.
    Repeated,
    /// Left the learning phase.
    Graduated,
    /// Successful review-phase repetition.
    Passed,
    /// Failed recall; back to the first learning step.
    Lapsed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    /// The validated grade the review was applied with.
    pub grade: Grade,
    pub previous: ScheduleState,
    pub state: ScheduleState,
    pub transition: Transition,
    pub graduated_this_review: bool,
    pub lapsed_this_review: bool,
}

impl ReviewOutcome {
    pub fn progress_event(&self) -> ProgressEvent {
        ProgressEvent {
            item_id: self.state.item_id,
            graduated_this_review: self.graduated_this_review,
            lapsed_this_review: self.lapsed_this_review,
            new_mastery_level: self.state.mastery_level,
        }
    }
}

/// Forwarded by the host to the points/achievements layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub item_id: i64,
    pub graduated_this_review: bool,
    pub lapsed_this_review: bool,
    pub new_mastery_level: u8,
}
