//! Interval planning: the learning/review phase state machine.
//!
//! - Learning phase: a fixed sequence of step waits is walked forward on
//!   good/easy recalls, repeated on hard, restarted on again. Passing the last
//!   step graduates the item with the configured graduation interval.
//! - Review phase: intervals grow by the ease factor (times the easy bonus on
//!   easy recalls), clamped to `[1, max_interval_days]`. A failed recall sends
//!   the item back to the first learning step.

use crate::config::SchedulerConfig;
use crate::models::{Grade, ScheduleState, Transition};
use chrono::{DateTime, Duration, Utc};

/// Schedule fields produced by one review.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedInterval {
    pub interval_days: u32,
    pub repetitions: u32,
    pub learning_step: u32,
    pub is_graduated: bool,
    pub next_review_at: DateTime<Utc>,
    pub transition: Transition,
}

/// Wait before learning step `step`. Out-of-range steps use the last wait,
/// an empty sequence means no wait.
fn step_wait(config: &SchedulerConfig, step: u32) -> Duration {
    let last = config.learning_step_count().saturating_sub(1);
    config
        .learning_step_offset(step.min(last))
        .unwrap_or_else(Duration::zero)
}

fn offset(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn clamp_interval(days: f64, config: &SchedulerConfig) -> u32 {
    let max = config.max_interval_days.max(1);
    if days.is_nan() {
        return 1;
    }
    days.clamp(1.0, f64::from(max)) as u32
}

fn lapse(reviewed_at: DateTime<Utc>, config: &SchedulerConfig) -> PlannedInterval {
    PlannedInterval {
        interval_days: 0,
        repetitions: 0,
        learning_step: 0,
        is_graduated: false,
        next_review_at: offset(reviewed_at, step_wait(config, 0)),
        transition: Transition::Lapsed,
    }
}

/// Computes the next schedule for `state` after a review graded `grade`.
///
/// `new_ease_factor` is the already-updated ease (see `ease::next_ease_factor`).
pub fn plan_next_interval(
    state: &ScheduleState,
    grade: Grade,
    new_ease_factor: f64,
    reviewed_at: DateTime<Utc>,
    config: &SchedulerConfig,
) -> PlannedInterval {
    if grade == Grade::Again {
        return lapse(reviewed_at, config);
    }

    if !state.is_graduated {
        return plan_learning_step(state, grade, reviewed_at, config);
    }

    let multiplier = match grade {
        Grade::Easy => config.easy_interval_multiplier,
        _ => 1.0,
    };
    let raw = f64::from(state.interval_days) * new_ease_factor * multiplier;
    let interval_days = clamp_interval(raw.round(), config);

    PlannedInterval {
        interval_days,
        repetitions: state.repetitions.saturating_add(1),
        learning_step: state.learning_step,
        is_graduated: true,
        next_review_at: offset(reviewed_at, Duration::days(i64::from(interval_days))),
        transition: Transition::Passed,
    }
}

fn plan_learning_step(
    state: &ScheduleState,
    grade: Grade,
    reviewed_at: DateTime<Utc>,
    config: &SchedulerConfig,
) -> PlannedInterval {
    if grade == Grade::Hard {
        return PlannedInterval {
            interval_days: 0,
            repetitions: state.repetitions,
            learning_step: state.learning_step,
            is_graduated: false,
            next_review_at: offset(reviewed_at, step_wait(config, state.learning_step)),
            transition: Transition::Repeated,
        };
    }

    let next_step = state.learning_step.saturating_add(1);
    if next_step >= config.learning_step_count() {
        let interval_days = clamp_interval(f64::from(config.graduation_interval), config);
        return PlannedInterval {
            interval_days,
            repetitions: 1,
            learning_step: next_step,
            is_graduated: true,
            next_review_at: offset(reviewed_at, Duration::days(i64::from(interval_days))),
            transition: Transition::Graduated,
        };
    }

    PlannedInterval {
        interval_days: 0,
        repetitions: state.repetitions,
        learning_step: next_step,
        is_graduated: false,
        next_review_at: offset(reviewed_at, step_wait(config, next_step)),
        transition: Transition::Advanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn graduated(interval_days: u32, ease_factor: f64) -> ScheduleState {
        ScheduleState {
            interval_days,
            ease_factor,
            repetitions: 3,
            learning_step: 2,
            is_graduated: true,
            last_reviewed_at: Some(t0() - Duration::days(i64::from(interval_days))),
            next_review_at: t0(),
            ..ScheduleState::new(1, ease_factor, t0())
        }
    }

    #[test]
    fn test_first_step_advances() {
        let config = SchedulerConfig::default();
        let state = ScheduleState::new(1, 2.5, t0());

        let plan = plan_next_interval(&state, Grade::Good, 2.5, t0(), &config);
        assert_eq!(plan.transition, Transition::Advanced);
        assert_eq!(plan.learning_step, 1);
        assert!(!plan.is_graduated);
        assert_eq!(plan.interval_days, 0);
        assert_eq!(plan.next_review_at, t0() + Duration::days(6));
    }

    #[test]
    fn test_last_step_graduates() {
        let config = SchedulerConfig::default();
        let state = ScheduleState {
            learning_step: 1,
            ..ScheduleState::new(1, 2.5, t0())
        };

        let plan = plan_next_interval(&state, Grade::Easy, 2.65, t0(), &config);
        assert_eq!(plan.transition, Transition::Graduated);
        assert!(plan.is_graduated);
        assert_eq!(plan.interval_days, 1);
        assert_eq!(plan.repetitions, 1);
        assert_eq!(plan.next_review_at, t0() + Duration::days(1));
    }

    #[test]
    fn test_hard_repeats_step() {
        let config = SchedulerConfig::default();
        let state = ScheduleState {
            learning_step: 1,
            ..ScheduleState::new(1, 2.5, t0())
        };

        let plan = plan_next_interval(&state, Grade::Hard, 2.35, t0(), &config);
        assert_eq!(plan.transition, Transition::Repeated);
        assert_eq!(plan.learning_step, 1);
        assert_eq!(plan.next_review_at, t0() + Duration::days(6));
    }

    #[test]
    fn test_again_in_learning_restarts() {
        let config = SchedulerConfig::default();
        let state = ScheduleState {
            learning_step: 1,
            ..ScheduleState::new(1, 2.5, t0())
        };

        let plan = plan_next_interval(&state, Grade::Again, 2.3, t0(), &config);
        assert_eq!(plan.transition, Transition::Lapsed);
        assert_eq!(plan.learning_step, 0);
        assert_eq!(plan.repetitions, 0);
        assert_eq!(plan.next_review_at, t0() + Duration::days(1));
    }

    #[test]
    fn test_review_interval_grows_by_ease() {
        let config = SchedulerConfig::default();
        let plan = plan_next_interval(&graduated(10, 2.5), Grade::Good, 2.5, t0(), &config);
        assert_eq!(plan.transition, Transition::Passed);
        assert_eq!(plan.interval_days, 25);
        assert_eq!(plan.repetitions, 4);
        assert_eq!(plan.next_review_at, t0() + Duration::days(25));
    }

    #[test]
    fn test_easy_gets_bonus() {
        let config = SchedulerConfig::default();
        // 10 * 2.65 * 1.3 = 34.45
        let plan = plan_next_interval(&graduated(10, 2.5), Grade::Easy, 2.65, t0(), &config);
        assert_eq!(plan.interval_days, 34);
    }

    #[test]
    fn test_hard_uses_lowered_ease() {
        let config = SchedulerConfig::default();
        // 10 * 2.35 = 23.5, rounds away from zero
        let plan = plan_next_interval(&graduated(10, 2.5), Grade::Hard, 2.35, t0(), &config);
        assert_eq!(plan.interval_days, 24);
    }

    #[test]
    fn test_interval_clamped_to_max() {
        let config = SchedulerConfig {
            max_interval_days: 100,
            ..SchedulerConfig::default()
        };
        let plan = plan_next_interval(&graduated(90, 2.5), Grade::Easy, 2.65, t0(), &config);
        assert_eq!(plan.interval_days, 100);
    }

    #[test]
    fn test_graduated_zero_interval_clamped_to_one_day() {
        let config = SchedulerConfig::default();
        let plan = plan_next_interval(&graduated(0, 2.5), Grade::Good, 2.5, t0(), &config);
        assert_eq!(plan.interval_days, 1);
    }

    #[test]
    fn test_lapse_from_review_phase() {
        let config = SchedulerConfig::default();
        let plan = plan_next_interval(&graduated(25, 2.5), Grade::Again, 2.3, t0(), &config);
        assert!(!plan.is_graduated);
        assert_eq!(plan.interval_days, 0);
        assert_eq!(plan.repetitions, 0);
        assert_eq!(plan.learning_step, 0);
    }

    #[test]
    fn test_empty_steps_graduate_immediately() {
        let config = SchedulerConfig {
            learning_step_offsets: Vec::new(),
            ..SchedulerConfig::default()
        };
        let state = ScheduleState::new(1, 2.5, t0());

        let plan = plan_next_interval(&state, Grade::Good, 2.5, t0(), &config);
        assert_eq!(plan.transition, Transition::Graduated);

        let plan = plan_next_interval(&state, Grade::Hard, 2.35, t0(), &config);
        assert_eq!(plan.next_review_at, t0());
    }
}
