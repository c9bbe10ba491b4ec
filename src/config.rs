//! Scheduler configuration.
//!
//! All tuning constants of the review engine live here, loaded once when the
//! scheduler is constructed. Stored as TOML; every key is optional and falls
//! back to SM-2-family defaults.

use crate::error::ConfigError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Waits before each learning-phase step, in minutes.
    #[serde(default = "default_learning_step_offsets")]
    pub learning_step_offsets: Vec<u32>,
    /// First review-phase interval after graduation, in days.
    #[serde(default = "default_graduation_interval")]
    pub graduation_interval: u32,
    #[serde(default = "default_initial_ease_factor")]
    pub initial_ease_factor: f64,
    #[serde(default = "default_ease_floor")]
    pub ease_floor: f64,
    #[serde(default = "default_ease_penalty_again")]
    pub ease_penalty_again: f64,
    #[serde(default = "default_ease_penalty_hard")]
    pub ease_penalty_hard: f64,
    #[serde(default = "default_ease_bonus_easy")]
    pub ease_bonus_easy: f64,
    #[serde(default = "default_easy_interval_multiplier")]
    pub easy_interval_multiplier: f64,
    #[serde(default = "default_learning_mastery_gain")]
    pub learning_mastery_gain: u8,
    #[serde(default = "default_graduation_mastery_gain")]
    pub graduation_mastery_gain: u8,
    #[serde(default = "default_lapse_mastery_penalty")]
    pub lapse_mastery_penalty: u8,
    /// Maximum reviews per day. 0 disables the limit.
    #[serde(default = "default_daily_review_cap")]
    pub daily_review_cap: usize,
    #[serde(default = "default_max_interval_days")]
    pub max_interval_days: u32,
}

fn default_learning_step_offsets() -> Vec<u32> {
    vec![24 * 60, 6 * 24 * 60]
}
fn default_graduation_interval() -> u32 {
    1
}
fn default_initial_ease_factor() -> f64 {
    2.5
}
fn default_ease_floor() -> f64 {
    1.3
}
fn default_ease_penalty_again() -> f64 {
    0.20
}
fn default_ease_penalty_hard() -> f64 {
    0.15
}
fn default_ease_bonus_easy() -> f64 {
    0.15
}
fn default_easy_interval_multiplier() -> f64 {
    1.3
}
fn default_learning_mastery_gain() -> u8 {
    8
}
fn default_graduation_mastery_gain() -> u8 {
    15
}
fn default_lapse_mastery_penalty() -> u8 {
    20
}
fn default_daily_review_cap() -> usize {
    50
}
fn default_max_interval_days() -> u32 {
    3650
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            learning_step_offsets: default_learning_step_offsets(),
            graduation_interval: default_graduation_interval(),
            initial_ease_factor: default_initial_ease_factor(),
            ease_floor: default_ease_floor(),
            ease_penalty_again: default_ease_penalty_again(),
            ease_penalty_hard: default_ease_penalty_hard(),
            ease_bonus_easy: default_ease_bonus_easy(),
            easy_interval_multiplier: default_easy_interval_multiplier(),
            learning_mastery_gain: default_learning_mastery_gain(),
            graduation_mastery_gain: default_graduation_mastery_gain(),
            lapse_mastery_penalty: default_lapse_mastery_penalty(),
            daily_review_cap: default_daily_review_cap(),
            max_interval_days: default_max_interval_days(),
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads config from `path`, or returns defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No scheduler config, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.initial_ease_factor,
            self.ease_floor,
            self.ease_penalty_again,
            self.ease_penalty_hard,
            self.ease_bonus_easy,
            self.easy_interval_multiplier,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid(
                "ease and multiplier values must be finite".to_string(),
            ));
        }
        if self.ease_floor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "ease_floor must be positive, got {}",
                self.ease_floor
            )));
        }
        if self.initial_ease_factor < self.ease_floor {
            return Err(ConfigError::Invalid(format!(
                "initial_ease_factor {} is below ease_floor {}",
                self.initial_ease_factor, self.ease_floor
            )));
        }
        if self.ease_penalty_again < 0.0 || self.ease_penalty_hard < 0.0 || self.ease_bonus_easy < 0.0
        {
            return Err(ConfigError::Invalid(
                "ease penalties and bonus must not be negative".to_string(),
            ));
        }
        if self.easy_interval_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "easy_interval_multiplier must be at least 1.0, got {}",
                self.easy_interval_multiplier
            )));
        }
        if self.graduation_interval == 0 {
            return Err(ConfigError::Invalid(
                "graduation_interval must be at least 1 day".to_string(),
            ));
        }
        if self.max_interval_days < self.graduation_interval {
            return Err(ConfigError::Invalid(format!(
                "max_interval_days {} is shorter than graduation_interval {}",
                self.max_interval_days, self.graduation_interval
            )));
        }
        if self.lapse_mastery_penalty > 100
            || self.learning_mastery_gain > 100
            || self.graduation_mastery_gain > 100
        {
            return Err(ConfigError::Invalid(
                "mastery gains and penalty must be within 0-100".to_string(),
            ));
        }
        Ok(())
    }

    /// Wait before the learning step at `step`, or `None` past the last step.
    pub fn learning_step_offset(&self, step: u32) -> Option<Duration> {
        self.learning_step_offsets
            .get(step as usize)
            .map(|&minutes| Duration::minutes(i64::from(minutes)))
    }

    pub fn learning_step_count(&self) -> u32 {
        u32::try_from(self.learning_step_offsets.len()).unwrap_or(u32::MAX)
    }
}
