//! Ease factor adjustment.
//!
//! Asymmetric SM-2-family deltas: failures and hard recalls lower the ease,
//! good recalls leave it alone, easy recalls raise it. The result never drops
//! below the configured floor.

use crate::config::SchedulerConfig;
use crate::models::Grade;

/// Replaces a corrupt (non-finite) stored ease with the initial ease and
/// lifts anything below the floor.
pub fn sanitize_ease_factor(ease_factor: f64, config: &SchedulerConfig) -> f64 {
    let ease = if ease_factor.is_finite() {
        ease_factor
    } else {
        config.initial_ease_factor
    };
    ease.max(config.ease_floor)
}

pub fn next_ease_factor(current_ease_factor: f64, grade: Grade, config: &SchedulerConfig) -> f64 {
    let current = sanitize_ease_factor(current_ease_factor, config);
    let next = match grade {
        Grade::Again => current - config.ease_penalty_again,
        Grade::Hard => current - config.ease_penalty_hard,
        Grade::Good => current,
        Grade::Easy => current + config.ease_bonus_easy,
    };
    next.max(config.ease_floor)
}
