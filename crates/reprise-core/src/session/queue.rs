//! Session queue
//!
//! Due cards are selected once when the session starts. Order never changes
//! afterwards, even if due times in the store do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::{Card, CardMemory};
use crate::storage::{Result, StudyStore};

/// Which cards a session draws from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "deckId", rename_all = "camelCase")]
pub enum StudyScope {
    #[default]
    All,
    Deck(String),
}

impl std::fmt::Display for StudyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudyScope::All => write!(f, "all decks"),
            StudyScope::Deck(id) => write!(f, "deck {}", id),
        }
    }
}

/// Ordered snapshot of due cards plus a cursor
#[derive(Debug, Clone)]
pub struct SessionQueue {
    scope: StudyScope,
    cards: Vec<Card>,
    cursor: usize,
}

impl SessionQueue {
    /// Select up to `max_cards` cards due at `now`, New first, then Learning,
    /// Relearning, Review, each group by due time
    pub fn start(
        store: &dyn StudyStore,
        scope: StudyScope,
        now: DateTime<Utc>,
        max_cards: usize,
    ) -> Result<Self> {
        let cards = store.due_cards(&scope, now, max_cards)?;
        tracing::debug!(%scope, cards = cards.len(), "Session queue built");
        Ok(Self::from_cards(scope, cards))
    }

    /// Queue over an already ordered card list
    pub fn from_cards(scope: StudyScope, cards: Vec<Card>) -> Self {
        Self {
            scope,
            cards,
            cursor: 0,
        }
    }

    /// Card under the cursor; `None` once the session is complete
    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.cursor)
    }

    /// Move forward one card. Stays put at the end.
    pub fn advance(&mut self) {
        if self.cursor < self.cards.len() {
            self.cursor += 1;
        }
    }

    /// Move back one card; false at the start
    pub(crate) fn retreat(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.cards.len()
    }

    /// Back to the first card, same selection
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Index of the current card
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn scope(&self) -> &StudyScope {
        &self.scope
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Share of the queue already passed, 0..=100
    pub fn progress_percent(&self) -> u32 {
        if self.cards.is_empty() {
            return 0;
        }
        ((self.cursor as f64 / self.cards.len() as f64) * 100.0).round() as u32
    }

    /// Keep the snapshot at `index` in step with what was persisted
    pub(crate) fn set_memory(&mut self, index: usize, memory: CardMemory) {
        if let Some(card) = self.cards.get_mut(index) {
            card.memory = memory;
        }
    }
}
