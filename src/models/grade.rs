//! Recall-quality grades and validation of raw learner input.

use crate::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How well the learner recalled an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Failed to recall.
    Again,
    /// Recalled with difficulty.
    Hard,
    /// Recalled correctly.
    Good,
    /// Recalled effortlessly.
    Easy,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    /// Numeric level, 1 (again) to 4 (easy).
    pub fn level(self) -> u8 {
        match self {
            Grade::Again => 1,
            Grade::Hard => 2,
            Grade::Good => 3,
            Grade::Easy => 4,
        }
    }

    pub fn is_pass(self) -> bool {
        !matches!(self, Grade::Again)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(Grade::Again),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            _ => Err(ReviewError::InvalidGrade(s.to_string())),
        }
    }
}

/// Grade as supplied by the caller, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawGrade {
    Level(i64),
    Label(String),
}

impl From<&str> for RawGrade {
    fn from(label: &str) -> Self {
        RawGrade::Label(label.to_string())
    }
}

impl From<String> for RawGrade {
    fn from(label: String) -> Self {
        RawGrade::Label(label)
    }
}

impl From<i64> for RawGrade {
    fn from(level: i64) -> Self {
        RawGrade::Level(level)
    }
}

impl From<Grade> for RawGrade {
    fn from(grade: Grade) -> Self {
        RawGrade::Label(grade.as_str().to_string())
    }
}

/// Validates raw input into a [`Grade`].
///
/// Accepts the labels again/hard/good/easy (any case, surrounding whitespace
/// ignored) or the levels 1-4. Anything else is `InvalidGrade`.
pub fn validate(raw: &RawGrade) -> Result<Grade, ReviewError> {
    match raw {
        RawGrade::Label(label) => {
            // Numeric strings arrive this way from the command line.
            if let Ok(level) = label.trim().parse::<i64>() {
                return validate(&RawGrade::Level(level));
            }
            label.parse()
        }
        RawGrade::Level(1) => Ok(Grade::Again),
        RawGrade::Level(2) => Ok(Grade::Hard),
        RawGrade::Level(3) => Ok(Grade::Good),
        RawGrade::Level(4) => Ok(Grade::Easy),
        RawGrade::Level(other) => Err(ReviewError::InvalidGrade(other.to_string())),
    }
}
