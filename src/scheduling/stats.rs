//! Deck-wide progress summary.

use crate::models::ScheduleState;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckStats {
    pub total: usize,
    pub learning: usize,
    pub graduated: usize,
    pub due: usize,
    /// Mean mastery over items reviewed at least once.
    pub average_mastery: Option<f64>,
}

impl DeckStats {
    pub fn from_states(all_states: &[ScheduleState], now: DateTime<Utc>) -> Self {
        let graduated = all_states.iter().filter(|s| s.is_graduated).count();
        let due = all_states.iter().filter(|s| s.is_due(now)).count();

        let reviewed: Vec<u8> = all_states
            .iter()
            .filter(|s| s.has_been_reviewed())
            .map(|s| s.mastery_level)
            .collect();
        let average_mastery = if reviewed.is_empty() {
            None
        } else {
            let sum: u64 = reviewed.iter().map(|&m| u64::from(m)).sum();
            Some(sum as f64 / reviewed.len() as f64)
        };

        Self {
            total: all_states.len(),
            learning: all_states.len() - graduated,
            graduated,
            due,
            average_mastery,
        }
    }
}
