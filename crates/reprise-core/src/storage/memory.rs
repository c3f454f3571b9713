//! In-memory store
//!
//! Same contract as the SQLite store, held in one mutex so the paired
//! operations apply as a unit.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::store::{CardStats, Result, StorageError, StudyStore, UnlockedAchievement};
use crate::memory::{Card, CardMemory, ReviewRecord};
use crate::progress::UserProgress;
use crate::session::StudyScope;

#[derive(Debug, Default)]
struct Inner {
    cards: HashMap<String, Card>,
    /// Append order
    reviews: Vec<ReviewRecord>,
    progress: Option<UserProgress>,
    achievements: Vec<UnlockedAchievement>,
}

/// Volatile [`StudyStore`] for tests and embedders
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All review records in append order
    pub fn reviews(&self) -> Result<Vec<ReviewRecord>> {
        Ok(self.lock()?.reviews.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Init("Store lock poisoned".into()))
    }
}

fn in_scope(card: &Card, scope: &StudyScope) -> bool {
    match scope {
        StudyScope::All => true,
        StudyScope::Deck(id) => &card.deck_id == id,
    }
}

fn overwrite_memory(inner: &mut Inner, memory: &CardMemory, updated_at: DateTime<Utc>) -> Result<()> {
    let card = inner
        .cards
        .get_mut(&memory.id)
        .ok_or_else(|| StorageError::NotFound(memory.id.clone()))?;
    card.memory = memory.clone();
    card.updated_at = updated_at;
    Ok(())
}

impl StudyStore for InMemoryStore {
    fn insert_card(&self, card: &Card) -> Result<()> {
        card.memory
            .validate()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;
        let mut inner = self.lock()?;
        if inner.cards.contains_key(card.id()) {
            return Err(StorageError::InvalidData(format!(
                "duplicate card id {}",
                card.id()
            )));
        }
        inner.cards.insert(card.id().to_string(), card.clone());
        Ok(())
    }

    fn get_card(&self, id: &str) -> Result<Option<Card>> {
        Ok(self.lock()?.cards.get(id).cloned())
    }

    fn due_cards(&self, scope: &StudyScope, now: DateTime<Utc>, limit: usize) -> Result<Vec<Card>> {
        let inner = self.lock()?;
        let mut due: Vec<Card> = inner
            .cards
            .values()
            .filter(|c| in_scope(c, scope) && c.memory.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.memory
                .state
                .queue_precedence()
                .cmp(&b.memory.state.queue_precedence())
                .then(a.memory.due.cmp(&b.memory.due))
                .then(a.created_at.cmp(&b.created_at))
                .then_with(|| a.id().cmp(b.id()))
        });
        due.truncate(limit);
        Ok(due)
    }

    fn update_memory(&self, memory: &CardMemory) -> Result<()> {
        overwrite_memory(&mut *self.lock()?, memory, Utc::now())
    }

    fn card_stats(&self, scope: &StudyScope, now: DateTime<Utc>) -> Result<CardStats> {
        let inner = self.lock()?;
        let mut stats = CardStats::default();
        for card in inner.cards.values().filter(|c| in_scope(c, scope)) {
            stats.tally(&card.memory, now);
        }
        Ok(stats)
    }

    fn last_review_for_card(&self, card_id: &str) -> Result<Option<ReviewRecord>> {
        let inner = self.lock()?;
        // Latest timestamp wins; among equal timestamps the later append
        let latest = inner
            .reviews
            .iter()
            .enumerate()
            .filter(|(_, r)| r.card_id == card_id)
            .max_by_key(|(i, r)| (r.reviewed_at, *i))
            .map(|(_, r)| r.clone());
        Ok(latest)
    }

    fn append_review(&self, record: &ReviewRecord) -> Result<()> {
        self.lock()?.reviews.push(record.clone());
        Ok(())
    }

    fn delete_review(&self, record_id: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let pos = inner
            .reviews
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| StorageError::NotFound(record_id.to_string()))?;
        inner.reviews.remove(pos);
        Ok(())
    }

    fn count_reviews(&self, card_id: Option<&str>) -> Result<i64> {
        let inner = self.lock()?;
        let count = match card_id {
            Some(id) => inner.reviews.iter().filter(|r| r.card_id == id).count(),
            None => inner.reviews.len(),
        };
        Ok(count as i64)
    }

    fn count_reviews_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let inner = self.lock()?;
        Ok(inner.reviews.iter().filter(|r| r.reviewed_at >= since).count() as i64)
    }

    fn commit_review(&self, memory: &CardMemory, record: &ReviewRecord) -> Result<()> {
        let mut inner = self.lock()?;
        overwrite_memory(&mut inner, memory, record.reviewed_at)?;
        inner.reviews.push(record.clone());
        Ok(())
    }

    fn rollback_review(&self, record_id: &str, snapshot: &CardMemory) -> Result<()> {
        let mut inner = self.lock()?;
        // Check both rows before touching either
        let pos = inner
            .reviews
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| StorageError::NotFound(record_id.to_string()))?;
        if !inner.cards.contains_key(&snapshot.id) {
            return Err(StorageError::NotFound(snapshot.id.clone()));
        }
        inner.reviews.remove(pos);
        overwrite_memory(&mut inner, snapshot, Utc::now())
    }

    fn load_progress(&self) -> Result<Option<UserProgress>> {
        Ok(self.lock()?.progress.clone())
    }

    fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        self.lock()?.progress = Some(progress.clone());
        Ok(())
    }

    fn unlocked_achievements(&self) -> Result<Vec<UnlockedAchievement>> {
        let mut unlocked = self.lock()?.achievements.clone();
        unlocked.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at).then(a.id.cmp(&b.id)));
        Ok(unlocked)
    }

    fn unlock_achievement(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.achievements.iter().any(|a| a.id == id) {
            return Ok(false);
        }
        inner.achievements.push(UnlockedAchievement {
            id: id.to_string(),
            unlocked_at: at,
        });
        Ok(true)
    }
}
