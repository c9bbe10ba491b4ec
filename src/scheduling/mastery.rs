//! Mastery score: a 0-100 progress signal derived from review transitions.
//!
//! Presentation only. Nothing in the scheduling math reads it back.

use crate::config::SchedulerConfig;
use crate::models::Transition;

pub const MAX_MASTERY: u8 = 100;

/// Minimum gain for a successful review-phase repetition.
const MIN_REVIEW_GAIN: u8 = 2;

pub fn update_mastery(current_mastery: u8, transition: Transition, config: &SchedulerConfig) -> u8 {
    let current = current_mastery.min(MAX_MASTERY);
    match transition {
        Transition::Lapsed => current.saturating_sub(config.lapse_mastery_penalty),
        Transition::Advanced | Transition::Repeated => {
            gain(current, config.learning_mastery_gain)
        }
        Transition::Graduated => gain(current, config.graduation_mastery_gain),
        // Diminishing returns as mastery approaches the cap
        Transition::Passed => gain(current, MIN_REVIEW_GAIN.max((MAX_MASTERY - current) / 10)),
    }
}

fn gain(current: u8, by: u8) -> u8 {
    current.saturating_add(by).min(MAX_MASTERY)
}
