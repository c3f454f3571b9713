//! Study configuration
//!
//! Every section deserializes with defaults, so a config file only needs the
//! keys it changes. Call [`StudyConfig::validate`] after loading.

use serde::{Deserialize, Serialize};

use crate::fsrs::{FSRSParameters, MAX_STABILITY};

/// Default number of cards pulled into one session
pub const DEFAULT_SESSION_SIZE: usize = 50;

/// Default daily review goal
pub const DEFAULT_DAILY_GOAL: u32 = 20;

/// Configuration error
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[error("weight w{index} must be finite and non-negative, got {value}")]
    InvalidWeight { index: usize, value: f64 },
}

/// Session queue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum cards per session
    pub max_cards: usize,
    /// Fixed seed for interval fuzz; `None` draws from the OS
    pub fuzz_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_cards: DEFAULT_SESSION_SIZE,
            fuzz_seed: None,
        }
    }
}

/// Progress aggregate settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Reviews per day counted as meeting the goal
    pub daily_goal: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub scheduler: FSRSParameters,
    pub session: SessionConfig,
    pub progress: ProgressConfig,
}

impl StudyConfig {
    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;
        if self.session.max_cards == 0 {
            return Err(ConfigError::OutOfRange {
                field: "session.max_cards",
                expected: "at least 1",
                value: 0.0,
            });
        }
        if self.progress.daily_goal == 0 {
            return Err(ConfigError::OutOfRange {
                field: "progress.daily_goal",
                expected: "at least 1",
                value: 0.0,
            });
        }
        Ok(())
    }
}

impl FSRSParameters {
    /// Reject parameter sets that break the forgetting-curve math
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, value) in self.weights.iter().copied().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { index, value });
            }
        }
        // Initial stabilities and the forget base must be strictly positive
        for index in [0, 1, 2, 3, 10] {
            if self.weights[index] <= 0.0 {
                return Err(ConfigError::InvalidWeight {
                    index,
                    value: self.weights[index],
                });
            }
        }
        let checks = [
            (
                "desired_retention",
                "in (0, 1)",
                self.desired_retention,
                self.desired_retention > 0.0 && self.desired_retention < 1.0,
            ),
            (
                "maximum_interval",
                "between 1 and 36500 days",
                self.maximum_interval,
                self.maximum_interval >= 1.0 && self.maximum_interval <= MAX_STABILITY,
            ),
            (
                "decay_factor",
                "positive",
                self.decay_factor,
                self.decay_factor > 0.0,
            ),
            (
                "curve_exponent",
                "positive",
                self.curve_exponent,
                self.curve_exponent > 0.0,
            ),
            (
                "learning_step_min_minutes",
                "positive",
                self.learning_step_min_minutes,
                self.learning_step_min_minutes > 0.0,
            ),
            (
                "learning_step_max_minutes",
                "between the minimum step and one day",
                self.learning_step_max_minutes,
                self.learning_step_max_minutes >= self.learning_step_min_minutes
                    && self.learning_step_max_minutes < 1440.0,
            ),
            (
                "short_term_again_factor",
                "in (0, 1]",
                self.short_term_again_factor,
                self.short_term_again_factor > 0.0 && self.short_term_again_factor <= 1.0,
            ),
        ];
        for (field, expected, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected,
                    value,
                });
            }
        }
        Ok(())
    }
}
