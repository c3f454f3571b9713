//! Memory module - Core types and data structures
//!
//! - Card memory: the per-item recall state the scheduler drives
//! - Cards: stored content plus memory
//! - Review records: the append-only grading log

mod card;
mod state;

pub use card::{Card, NewCard, ReviewRecord};
pub use state::{
    CardMemory, InvariantViolation, LearningState, MAX_DIFFICULTY, MILLIS_PER_DAY,
    MIN_DIFFICULTY, NEW_CARD_DIFFICULTY,
};
