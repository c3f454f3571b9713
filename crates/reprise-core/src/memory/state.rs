//! Card Memory - per-item recall state
//!
//! Plain data. Only the scheduler produces new values of this type; the
//! session controller stores them and, on undo, restores old snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Lower bound of the difficulty scale
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Upper bound of the difficulty scale
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Difficulty of an item that has never been graded.
///
/// Any value in range works: the first grade replaces it from the base table.
pub const NEW_CARD_DIFFICULTY: f64 = 5.0;

// ============================================================================
// LEARNING STATE
// ============================================================================

/// Discrete scheduling state of an item.
///
/// The string and integer encodings are part of the persisted format and
/// must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningState {
    /// Never graded
    #[default]
    New,
    /// Failed on first contact, cycling through short steps
    Learning,
    /// Graduated to day-scale intervals
    Review,
    /// Lapsed from Review, cycling through short steps again
    Relearning,
}

impl LearningState {
    /// All states in persisted integer order
    pub const ALL: [LearningState; 4] = [
        LearningState::New,
        LearningState::Learning,
        LearningState::Review,
        LearningState::Relearning,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningState::New => "new",
            LearningState::Learning => "learning",
            LearningState::Review => "review",
            LearningState::Relearning => "relearning",
        }
    }

    /// Integer encoding (0..=3)
    pub fn as_i32(&self) -> i32 {
        match self {
            LearningState::New => 0,
            LearningState::Learning => 1,
            LearningState::Review => 2,
            LearningState::Relearning => 3,
        }
    }

    /// Parse the integer encoding
    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.get(usize::try_from(value).ok()?).copied()
    }

    /// Position in a study session: New < Learning < Relearning < Review
    pub fn queue_precedence(&self) -> u8 {
        match self {
            LearningState::New => 0,
            LearningState::Learning => 1,
            LearningState::Relearning => 2,
            LearningState::Review => 3,
        }
    }

    /// Whether an Again grade in this state counts as a lapse
    pub fn is_lapse_on_again(&self) -> bool {
        matches!(self, LearningState::Review | LearningState::Relearning)
    }

    /// Whether the next interval is measured in minutes rather than days
    pub fn is_short_term(&self) -> bool {
        matches!(self, LearningState::Learning | LearningState::Relearning)
    }
}

impl std::fmt::Display for LearningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LearningState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(LearningState::New),
            "learning" => Ok(LearningState::Learning),
            "review" => Ok(LearningState::Review),
            "relearning" => Ok(LearningState::Relearning),
            _ => Err(format!("Unknown learning state: {}", s)),
        }
    }
}

// ============================================================================
// INVARIANTS
// ============================================================================

/// A memory record that breaks one of the model invariants
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("difficulty {0} outside [1, 10]")]
    Difficulty(f64),
    #[error("negative or non-finite {field}: {value}")]
    NegativeQuantity { field: &'static str, value: f64 },
    #[error("reps is 0 but state is {0}")]
    UngradedButNotNew(LearningState),
    #[error("reps is {0} but state is new")]
    GradedButNew(u32),
    #[error("last_review must be absent exactly when reps is 0 (reps={0})")]
    LastReviewMismatch(u32),
}

// ============================================================================
// CARD MEMORY
// ============================================================================

/// Recall state of one learnable item.
///
/// Timestamps travel as integer milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMemory {
    /// Opaque identifier, owned by the item store
    pub id: String,
    /// Intrinsic hardness (1.0 = easy, 10.0 = hard)
    pub difficulty: f64,
    /// Days until retrievability decays to the target retention
    pub stability: f64,
    /// Gap between the previous two gradings, in days
    pub elapsed_days: f64,
    /// Interval assigned at the last grading, in days
    pub scheduled_days: f64,
    /// Grading events applied
    pub reps: u32,
    /// Again grades received while in Review or Relearning
    pub lapses: u32,
    /// Discrete scheduling state
    pub state: LearningState,
    /// Eligible for study once `due <= now`
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due: DateTime<Utc>,
    /// Time of the last grading
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_review: Option<DateTime<Utc>>,
}

impl CardMemory {
    /// Memory for an item that has never been studied, due immediately
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            difficulty: NEW_CARD_DIFFICULTY,
            stability: 0.0,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            reps: 0,
            lapses: 0,
            state: LearningState::New,
            due: created_at,
            last_review: None,
        }
    }

    /// Whether the item may appear in a session started at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Days since the last grading, 0 for items never graded
    pub fn days_since_review(&self, now: DateTime<Utc>) -> f64 {
        match self.last_review {
            Some(last) => {
                let millis = (now - last).num_milliseconds().max(0);
                millis as f64 / MILLIS_PER_DAY
            }
            None => 0.0,
        }
    }

    /// Check every model invariant, reporting the first violation
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(InvariantViolation::Difficulty(self.difficulty));
        }
        for (field, value) in [
            ("stability", self.stability),
            ("elapsed_days", self.elapsed_days),
            ("scheduled_days", self.scheduled_days),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(InvariantViolation::NegativeQuantity { field, value });
            }
        }
        match (self.reps, self.state) {
            (0, LearningState::New) => {}
            (0, other) => return Err(InvariantViolation::UngradedButNotNew(other)),
            (reps, LearningState::New) => return Err(InvariantViolation::GradedButNew(reps)),
            _ => {}
        }
        if (self.reps == 0) != self.last_review.is_none() {
            return Err(InvariantViolation::LastReviewMismatch(self.reps));
        }
        Ok(())
    }
}

/// Milliseconds in one day
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ============================================================================
// TESTS
// ============================================================================
