//! FSRS Scheduler
//!
//! Turns (memory, rating, now) into the next memory state. Stateless apart
//! from its parameters: the random source for fuzz is always passed in, so
//! a seeded RNG reproduces every decision exactly.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::algorithm::{
    fuzz_interval, initial_difficulty, initial_stability, next_difficulty,
    next_forget_stability, next_interval, next_recall_stability, retrievability_with_decay,
    Weights, DEFAULT_CURVE_EXPONENT, DEFAULT_DECAY_FACTOR, DEFAULT_RETENTION, DEFAULT_WEIGHTS,
    FUZZ_THRESHOLD_DAYS, MAX_STABILITY, MIN_STABILITY,
};
use crate::memory::{CardMemory, LearningState, MILLIS_PER_DAY};

const MINUTES_PER_DAY: f64 = 1440.0;

// ============================================================================
// RATING
// ============================================================================

/// Learner's self-assessed recall quality.
///
/// The integer values are persisted in review logs and must never be
/// renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    /// Forgot
    Again = 1,
    /// Recalled with serious effort
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Instant recall
    Easy = 4,
}

impl Rating {
    /// All ratings in ascending order
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Parse a grade, `None` outside 1..=4
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Persisted value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn as_f64(self) -> f64 {
        f64::from(self.as_u8())
    }

    /// Zero-based position, used to index per-grade tables
    pub fn index(self) -> usize {
        usize::from(self.as_u8()) - 1
    }

    /// Display label
    pub fn name(self) -> &'static str {
        match self {
            Rating::Again => "Again",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }

    /// Whether the grade counts as a successful recall
    pub fn is_success(self) -> bool {
        self != Rating::Again
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.as_u8()
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::from_i32(i32::from(value))
            .ok_or_else(|| format!("Rating must be between 1 and 4, got {}", value))
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FSRSParameters {
    /// Memory-model weights
    pub weights: Weights,
    /// Target probability of recall at the due date
    pub desired_retention: f64,
    /// No item is scheduled further out than this many days
    pub maximum_interval: f64,
    /// Spread day-scale intervals to avoid due-date clustering
    pub enable_fuzz: bool,
    /// Forgetting curve factor
    pub decay_factor: f64,
    /// Forgetting curve exponent
    pub curve_exponent: f64,
    /// Shortest Learning/Relearning step
    pub learning_step_min_minutes: f64,
    /// Longest Learning/Relearning step
    pub learning_step_max_minutes: f64,
    /// Stability multiplier for Again while still Learning
    pub short_term_again_factor: f64,
}

impl Default for FSRSParameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            desired_retention: DEFAULT_RETENTION,
            maximum_interval: 365.0,
            enable_fuzz: true,
            decay_factor: DEFAULT_DECAY_FACTOR,
            curve_exponent: DEFAULT_CURVE_EXPONENT,
            learning_step_min_minutes: 1.0,
            learning_step_max_minutes: 10.0,
            short_term_again_factor: 0.5,
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Outcome of scheduling one grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// Memory after the grade
    pub memory: CardMemory,
    /// Interval that was assigned, in days (fractional for short-term steps)
    pub interval_days: f64,
    /// Recall probability at grading time, `None` for a first grade
    pub retrievability: Option<f64>,
}

/// What each grade would do, computed without committing anything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResults {
    pub again: ReviewResult,
    pub hard: ReviewResult,
    pub good: ReviewResult,
    pub easy: ReviewResult,
}

impl PreviewResults {
    /// Outcome for one rating
    pub fn get(&self, rating: Rating) -> &ReviewResult {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Next discrete state as a function of prior state and rating only
pub fn next_state(prior: LearningState, rating: Rating) -> LearningState {
    match (prior, rating) {
        (LearningState::New | LearningState::Learning, Rating::Again) => LearningState::Learning,
        (LearningState::Review | LearningState::Relearning, Rating::Again) => {
            LearningState::Relearning
        }
        (_, Rating::Hard | Rating::Good | Rating::Easy) => LearningState::Review,
    }
}

/// FSRS scheduler over a fixed parameter set
#[derive(Debug, Clone, Default)]
pub struct FSRSScheduler {
    params: FSRSParameters,
}

impl FSRSScheduler {
    /// Create a scheduler with the given parameters
    pub fn new(params: FSRSParameters) -> Self {
        Self { params }
    }

    /// Active parameters
    pub fn params(&self) -> &FSRSParameters {
        &self.params
    }

    /// Current probability of recall; New items report 1.0
    pub fn retrievability_at(&self, memory: &CardMemory, now: DateTime<Utc>) -> f64 {
        if memory.state == LearningState::New {
            return 1.0;
        }
        retrievability_with_decay(
            memory.days_since_review(now),
            memory.stability,
            self.params.decay_factor,
            self.params.curve_exponent,
        )
    }

    /// Apply one grade. The input is never modified.
    pub fn review<R: Rng + ?Sized>(
        &self,
        memory: &CardMemory,
        rating: Rating,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> ReviewResult {
        let w = &self.params.weights;
        let first_grade = memory.state == LearningState::New || memory.last_review.is_none();
        let elapsed_days = memory.days_since_review(now);

        let (difficulty, stability, retrievability) = if first_grade {
            (
                initial_difficulty(w, rating),
                initial_stability(w, rating),
                None,
            )
        } else {
            let r = self.retrievability_at(memory, now);
            let stability = match (memory.state, rating) {
                (state, Rating::Again) if state.is_lapse_on_again() => {
                    next_forget_stability(w, memory.difficulty, memory.stability, r)
                }
                (_, Rating::Again) => (memory.stability * self.params.short_term_again_factor)
                    .clamp(MIN_STABILITY, MAX_STABILITY),
                (_, success) => {
                    next_recall_stability(w, memory.difficulty, memory.stability, r, success)
                }
            };
            (
                next_difficulty(w, memory.difficulty, rating),
                stability,
                Some(r),
            )
        };

        let state = next_state(memory.state, rating);
        let lapses = if rating == Rating::Again && memory.state.is_lapse_on_again() {
            memory.lapses + 1
        } else {
            memory.lapses
        };

        let interval_days = self.interval_for(stability, state, rng);
        let due = due_after(now, interval_days);

        tracing::debug!(
            card_id = %memory.id,
            rating = rating.as_u8(),
            from = %memory.state,
            to = %state,
            stability,
            difficulty,
            interval_days,
            "Scheduled review"
        );

        ReviewResult {
            memory: CardMemory {
                id: memory.id.clone(),
                difficulty,
                stability,
                elapsed_days,
                scheduled_days: interval_days,
                reps: memory.reps + 1,
                lapses,
                state,
                due,
                last_review: Some(now),
            },
            interval_days,
            retrievability,
        }
    }

    /// Outcome of every rating, each computed from the same RNG state.
    ///
    /// The caller's RNG is not advanced, so previewing and then grading with
    /// the same RNG yields the previewed result.
    pub fn preview<R: Rng + Clone>(
        &self,
        memory: &CardMemory,
        now: DateTime<Utc>,
        rng: &R,
    ) -> PreviewResults {
        let outcome = |rating: Rating| self.review(memory, rating, now, &mut rng.clone());
        PreviewResults {
            again: outcome(Rating::Again),
            hard: outcome(Rating::Hard),
            good: outcome(Rating::Good),
            easy: outcome(Rating::Easy),
        }
    }

    /// Interval in days for a new stability landing in `state`
    fn interval_for<R: Rng + ?Sized>(&self, stability: f64, state: LearningState, rng: &mut R) -> f64 {
        let p = &self.params;
        let raw = next_interval(stability, p.desired_retention, p.decay_factor, p.curve_exponent);

        if state.is_short_term() {
            let minutes = (raw * MINUTES_PER_DAY)
                .round()
                .clamp(p.learning_step_min_minutes, p.learning_step_max_minutes);
            return minutes / MINUTES_PER_DAY;
        }

        let interval = raw.round().clamp(1.0, p.maximum_interval);
        if p.enable_fuzz && interval >= FUZZ_THRESHOLD_DAYS {
            let draw: f64 = rng.gen_range(0.0..1.0);
            fuzz_interval(interval, p.maximum_interval, draw)
        } else {
            interval
        }
    }
}

/// `now` plus a fractional number of days, saturating at the latest
/// representable instant
fn due_after(now: DateTime<Utc>, interval_days: f64) -> DateTime<Utc> {
    let millis = (interval_days * MILLIS_PER_DAY).round() as i64;
    Duration::try_milliseconds(millis)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Schedule one grade with explicit parameters and random source
pub fn schedule_review<R: Rng + ?Sized>(
    memory: &CardMemory,
    rating: Rating,
    now: DateTime<Utc>,
    params: &FSRSParameters,
    rng: &mut R,
) -> CardMemory {
    FSRSScheduler::new(params.clone())
        .review(memory, rating, now, rng)
        .memory
}

/// Human-readable interval between `now` and `due`: `<1m`, `10m`, `5h`, `3d`, `2mo`, `1y`
pub fn format_interval(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let millis = (due - now).num_milliseconds() as f64;
    let minutes = (millis / 60_000.0).round();
    let hours = (millis / 3_600_000.0).round();
    let days = (millis / MILLIS_PER_DAY).round();

    if minutes < 1.0 {
        "<1m".to_string()
    } else if minutes < 60.0 {
        format!("{}m", minutes)
    } else if hours < 24.0 {
        format!("{}h", hours)
    } else if days < 30.0 {
        format!("{}d", days)
    } else if days < 365.0 {
        format!("{}mo", (days / 30.0).round())
    } else {
        format!("{}y", (days / 365.0).round())
    }
}

// ============================================================================
// TESTS
// ============================================================================
