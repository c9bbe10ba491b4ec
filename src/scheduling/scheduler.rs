//! Review submission: validate, then run ease, interval and mastery updates.

use super::{ease, interval, mastery};
use crate::clock::{ClockSource, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::{ConfigError, Result, ReviewError};
use crate::models::{ReviewOutcome, ReviewSubmission, ScheduleState, Transition, grade};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Applies review submissions to schedule states.
///
/// Pure with respect to its inputs: the clock is only read when a submission
/// carries no timestamp. The caller persists the returned state and must not
/// run two submissions for the same item concurrently.
#[derive(Debug, Clone)]
pub struct ReviewScheduler<C = SystemClock> {
    config: SchedulerConfig,
    clock: C,
}

impl ReviewScheduler<SystemClock> {
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: ClockSource> ReviewScheduler<C> {
    /// Fails if `config` doesn't pass `SchedulerConfig::validate`.
    pub fn with_clock(config: SchedulerConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fresh state for an item entering the deck now.
    pub fn new_state(&self, item_id: i64) -> ScheduleState {
        ScheduleState::new(item_id, self.config.initial_ease_factor, self.clock.now())
    }

    pub fn submit_review(
        &self,
        current: &ScheduleState,
        submission: &ReviewSubmission,
    ) -> Result<ReviewOutcome> {
        if submission.item_id != current.item_id {
            return Err(ReviewError::ItemMismatch {
                expected: current.item_id,
                found: submission.item_id,
            });
        }

        let grade = grade::validate(&submission.grade)?;
        let submitted_at = submission.submitted_at.unwrap_or_else(|| self.clock.now());

        // Equal timestamps are a replay of the same action
        if let Some(last_reviewed_at) = current.last_reviewed_at {
            if submitted_at <= last_reviewed_at {
                warn!(
                    item_id = current.item_id,
                    %submitted_at,
                    %last_reviewed_at,
                    "Rejecting stale review submission"
                );
                return Err(ReviewError::StaleSubmission {
                    item_id: current.item_id,
                    submitted_at,
                    last_reviewed_at,
                });
            }
        }

        let ease_factor = ease::next_ease_factor(current.ease_factor, grade, &self.config);
        let plan =
            interval::plan_next_interval(current, grade, ease_factor, submitted_at, &self.config);
        let mastery_level =
            mastery::update_mastery(current.mastery_level, plan.transition, &self.config);

        let state = ScheduleState {
            item_id: current.item_id,
            ease_factor,
            interval_days: plan.interval_days,
            repetitions: plan.repetitions,
            learning_step: plan.learning_step,
            is_graduated: plan.is_graduated,
            last_reviewed_at: Some(submitted_at),
            next_review_at: plan.next_review_at.max(submitted_at),
            mastery_level,
        };

        debug!(
            item_id = state.item_id,
            %grade,
            transition = ?plan.transition,
            ease_factor = state.ease_factor,
            interval_days = state.interval_days,
            next_review_at = %state.next_review_at,
            "Review applied"
        );

        let graduated_this_review = plan.transition == Transition::Graduated;
        let lapsed_this_review = plan.transition == Transition::Lapsed;
        if graduated_this_review {
            info!(item_id = state.item_id, "Item graduated to review phase");
        } else if lapsed_this_review && current.is_graduated {
            info!(item_id = state.item_id, "Item lapsed back to learning phase");
        }

        Ok(ReviewOutcome {
            grade,
            previous: current.clone(),
            state,
            transition: plan.transition,
            graduated_this_review,
            lapsed_this_review,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Grade, RawGrade};
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn scheduler() -> ReviewScheduler<FixedClock> {
        ReviewScheduler::with_clock(SchedulerConfig::default(), FixedClock(t(0))).unwrap()
    }

    #[test]
    fn test_fresh_item_good_advances() {
        let scheduler = scheduler();
        let state = scheduler.new_state(1);

        let outcome = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, "good").at(t(10)))
            .unwrap();

        assert_eq!(outcome.state.learning_step, 1);
        assert!(!outcome.state.is_graduated);
        assert_eq!(outcome.state.ease_factor, 2.5);
        assert_eq!(outcome.transition, Transition::Advanced);
        assert!(!outcome.graduated_this_review);
        assert!(!outcome.lapsed_this_review);
        assert_eq!(outcome.state.last_reviewed_at, Some(t(10)));
        assert_eq!(outcome.previous, state);
    }

    #[test]
    fn test_last_step_good_graduates() {
        let scheduler = scheduler();
        let state = ScheduleState {
            learning_step: 1,
            ..scheduler.new_state(1)
        };

        let outcome = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, "good").at(t(10)))
            .unwrap();

        assert!(outcome.state.is_graduated);
        assert_eq!(outcome.state.interval_days, 1);
        assert_eq!(outcome.state.repetitions, 1);
        assert!(outcome.graduated_this_review);
        assert_eq!(outcome.state.mastery_level, 15);
    }

    #[test]
    fn test_graduated_good_multiplies_interval() {
        let scheduler = scheduler();
        let state = ScheduleState {
            interval_days: 10,
            repetitions: 2,
            learning_step: 2,
            is_graduated: true,
            last_reviewed_at: Some(t(0)),
            next_review_at: t(0) + Duration::days(10),
            ..scheduler.new_state(1)
        };
        let at = t(0) + Duration::days(10);

        let outcome = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, "good").at(at))
            .unwrap();

        assert_eq!(outcome.state.interval_days, 25);
        assert_eq!(outcome.state.repetitions, 3);
        assert_eq!(outcome.state.ease_factor, 2.5);
        assert_eq!(outcome.state.next_review_at, at + Duration::days(25));
    }

    #[test]
    fn test_graduated_again_lapses() {
        let scheduler = scheduler();
        let state = ScheduleState {
            interval_days: 25,
            repetitions: 4,
            learning_step: 2,
            is_graduated: true,
            mastery_level: 60,
            last_reviewed_at: Some(t(0)),
            next_review_at: t(0) + Duration::days(25),
            ..scheduler.new_state(1)
        };

        let outcome = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, "again").at(t(100)))
            .unwrap();

        assert!(!outcome.state.is_graduated);
        assert_eq!(outcome.state.learning_step, 0);
        assert_eq!(outcome.state.repetitions, 0);
        assert_eq!(outcome.state.interval_days, 0);
        assert!((outcome.state.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(outcome.state.mastery_level, 40);
        assert!(outcome.lapsed_this_review);
    }

    #[test]
    fn test_duplicate_submission_is_stale() {
        let scheduler = scheduler();
        let state = scheduler.new_state(1);
        let submission = ReviewSubmission::new(1, "good").at(t(100));

        let first = scheduler.submit_review(&state, &submission).unwrap();
        assert_eq!(first.state.last_reviewed_at, Some(t(100)));

        let err = scheduler
            .submit_review(&first.state, &ReviewSubmission::new(1, "easy").at(t(100)))
            .unwrap_err();
        assert!(matches!(err, ReviewError::StaleSubmission { item_id: 1, .. }));

        let err = scheduler.submit_review(&first.state, &submission).unwrap_err();
        assert!(matches!(err, ReviewError::StaleSubmission { .. }));
    }

    #[test]
    fn test_out_of_order_submission_is_stale() {
        let scheduler = scheduler();
        let state = ScheduleState {
            last_reviewed_at: Some(t(500)),
            next_review_at: t(600),
            ..scheduler.new_state(1)
        };

        let err = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, "good").at(t(499)))
            .unwrap_err();
        assert!(matches!(err, ReviewError::StaleSubmission { .. }));
    }

    #[test]
    fn test_invalid_grade() {
        let scheduler = scheduler();
        let state = scheduler.new_state(1);

        let err = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, RawGrade::Level(9)))
            .unwrap_err();
        assert!(matches!(err, ReviewError::InvalidGrade(_)));
    }

    #[test]
    fn test_item_mismatch() {
        let scheduler = scheduler();
        let state = scheduler.new_state(1);

        let err = scheduler
            .submit_review(&state, &ReviewSubmission::new(2, "good"))
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::ItemMismatch {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn test_missing_timestamp_uses_clock() {
        let scheduler =
            ReviewScheduler::with_clock(SchedulerConfig::default(), FixedClock(t(42))).unwrap();
        let state = ScheduleState::new(1, 2.5, t(0));

        let outcome = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, 3i64))
            .unwrap();
        assert_eq!(outcome.state.last_reviewed_at, Some(t(42)));
        assert_eq!(outcome.state.next_review_at, t(42) + Duration::days(6));
    }

    #[test]
    fn test_progress_event() {
        let scheduler = scheduler();
        let state = ScheduleState {
            learning_step: 1,
            mastery_level: 16,
            ..scheduler.new_state(5)
        };

        let outcome = scheduler
            .submit_review(&state, &ReviewSubmission::new(5, "easy").at(t(1)))
            .unwrap();
        let event = outcome.progress_event();

        assert_eq!(event.item_id, 5);
        assert!(event.graduated_this_review);
        assert!(!event.lapsed_this_review);
        assert_eq!(event.new_mastery_level, 31);
    }

    #[test]
    fn test_unvalidated_config_rejected() {
        let config = SchedulerConfig {
            ease_floor: f64::NAN,
            ..SchedulerConfig::default()
        };
        let result = ReviewScheduler::with_clock(config, FixedClock(t(0)));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let config = SchedulerConfig {
            graduation_interval: 0,
            ..SchedulerConfig::default()
        };
        assert!(ReviewScheduler::new(config).is_err());
    }

    #[test]
    fn test_outcome_carries_validated_grade() {
        let scheduler = scheduler();
        let state = scheduler.new_state(1);

        let outcome = scheduler
            .submit_review(&state, &ReviewSubmission::new(1, "EASY").at(t(1)))
            .unwrap();
        assert_eq!(outcome.grade, Grade::Easy);
    }
}
