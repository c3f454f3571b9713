//! Card - the stored unit of study
//!
//! A card pairs opaque front/back content with the memory model that the
//! scheduler drives. The core never interprets the content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::CardMemory;
use crate::fsrs::Rating;

// ============================================================================
// CARD
// ============================================================================

/// A flashcard as held by the item store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Collection the card belongs to
    pub deck_id: String,
    /// Prompt side
    pub front: String,
    /// Answer side
    pub back: String,
    /// When the card was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// When the card row was last written
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Scheduling state
    #[serde(flatten)]
    pub memory: CardMemory,
}

impl Card {
    /// Card identifier
    pub fn id(&self) -> &str {
        &self.memory.id
    }

    /// Build a fresh, never-studied card from its content
    pub fn from_input(input: NewCard, now: DateTime<Utc>) -> Self {
        Self {
            deck_id: input.deck_id,
            front: input.front,
            back: input.back,
            created_at: now,
            updated_at: now,
            memory: CardMemory::new(uuid::Uuid::new_v4().to_string(), now),
        }
    }
}

/// Input for creating a card
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub deck_id: String,
    pub front: String,
    pub back: String,
}

// ============================================================================
// REVIEW RECORD
// ============================================================================

/// One entry of the append-only review log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Unique record ID (UUID v4)
    pub id: String,
    /// Graded card
    pub card_id: String,
    /// Deck of the graded card at grading time
    pub deck_id: String,
    /// Grade given, persisted as 1..=4
    pub rating: Rating,
    /// Time the learner spent on the card, in milliseconds
    pub time_spent_ms: i64,
    /// When the grade was applied
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Create a record for a grade applied to `card` at `reviewed_at`
    pub fn new(card: &Card, rating: Rating, time_spent_ms: i64, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            card_id: card.id().to_string(),
            deck_id: card.deck_id.clone(),
            rating,
            time_spent_ms: time_spent_ms.max(0),
            reviewed_at,
        }
    }
}
