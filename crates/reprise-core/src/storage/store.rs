//! Store contract
//!
//! The session controller depends only on this trait. Both the grade pair
//! (memory write + review append) and the undo pair (review delete + memory
//! restore) are single calls so that every backend applies them atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::{Card, CardMemory, LearningState, ReviewRecord};
use crate::progress::UserProgress;
use crate::session::StudyScope;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Card or review not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored data breaks a model invariant
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STATS
// ============================================================================

/// Card counts for a scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub total: i64,
    pub new: i64,
    /// Learning and Relearning together
    pub learning: i64,
    pub review: i64,
    pub due: i64,
}

impl CardStats {
    /// Count one card into the matching buckets
    pub fn tally(&mut self, memory: &CardMemory, now: DateTime<Utc>) {
        self.total += 1;
        match memory.state {
            LearningState::New => self.new += 1,
            LearningState::Learning | LearningState::Relearning => self.learning += 1,
            LearningState::Review => self.review += 1,
        }
        if memory.is_due(now) {
            self.due += 1;
        }
    }
}

/// An achievement the learner has unlocked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub unlocked_at: DateTime<Utc>,
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence for cards, the review log, and the progress aggregate
pub trait StudyStore: Send + Sync {
    /// Add a card
    fn insert_card(&self, card: &Card) -> Result<()>;

    /// Get a card by ID
    fn get_card(&self, id: &str) -> Result<Option<Card>>;

    /// Cards with `due <= now` in scope, ordered New, Learning, Relearning,
    /// Review, then by due time ascending, then by creation order
    fn due_cards(&self, scope: &StudyScope, now: DateTime<Utc>, limit: usize) -> Result<Vec<Card>>;

    /// Overwrite a card's memory fields
    fn update_memory(&self, memory: &CardMemory) -> Result<()>;

    /// Card counts in scope
    fn card_stats(&self, scope: &StudyScope, now: DateTime<Utc>) -> Result<CardStats>;

    /// Most recent review of a card by timestamp
    fn last_review_for_card(&self, card_id: &str) -> Result<Option<ReviewRecord>>;

    /// Append a review record
    fn append_review(&self, record: &ReviewRecord) -> Result<()>;

    /// Delete a review record by ID
    fn delete_review(&self, record_id: &str) -> Result<()>;

    /// Number of review records, optionally for one card
    fn count_reviews(&self, card_id: Option<&str>) -> Result<i64>;

    /// Number of reviews at or after `since`
    fn count_reviews_since(&self, since: DateTime<Utc>) -> Result<i64>;

    /// Write a card's new memory and append its review record, atomically
    fn commit_review(&self, memory: &CardMemory, record: &ReviewRecord) -> Result<()>;

    /// Delete a review record and restore the card's memory, atomically.
    ///
    /// Fails with `NotFound` and changes nothing if either row is missing.
    fn rollback_review(&self, record_id: &str, snapshot: &CardMemory) -> Result<()>;

    /// Load the progress aggregate, `None` before the first review
    fn load_progress(&self) -> Result<Option<UserProgress>>;

    /// Replace the progress aggregate
    fn save_progress(&self, progress: &UserProgress) -> Result<()>;

    /// All unlocked achievements, oldest first
    fn unlocked_achievements(&self) -> Result<Vec<UnlockedAchievement>>;

    /// Record an unlock; false if it was already unlocked
    fn unlock_achievement(&self, id: &str, at: DateTime<Utc>) -> Result<bool>;
}
