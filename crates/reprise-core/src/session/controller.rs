//! Grading and undo controller
//!
//! Drives one study session: schedules each grade, persists the new memory
//! together with its review record, and rolls back the most recent grade on
//! request. A failed write leaves the session exactly where it was.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::queue::{SessionQueue, StudyScope};
use super::stats::{SessionStats, SessionSummary};
use super::undo::{UndoEntry, UndoStack};
use crate::config::StudyConfig;
use crate::error::{Result, ReviewError};
use crate::events::{EventBus, ReviewEvent};
use crate::fsrs::{FSRSScheduler, PreviewResults, Rating, ReviewResult};
use crate::memory::{Card, CardMemory, ReviewRecord};
use crate::progress;
use crate::storage::{StorageError, StudyStore};

/// Where the session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// A card is waiting for a grade
    Ready,
    /// Every card has been graded, or none were due
    Complete,
}

/// What a successful grade did
#[derive(Debug, Clone)]
pub struct GradeOutcome {
    pub result: ReviewResult,
    pub record: ReviewRecord,
    /// Set when this grade finished the session
    pub summary: Option<SessionSummary>,
}

/// What a successful undo did
#[derive(Debug, Clone)]
pub struct UndoOutcome {
    /// Memory as restored in the store
    pub restored: CardMemory,
    /// Grade that was taken back
    pub rating: Rating,
    /// Review record that was deleted
    pub record_id: String,
}

/// One study session over a frozen queue
pub struct ReviewController {
    store: Arc<dyn StudyStore>,
    scheduler: FSRSScheduler,
    queue: SessionQueue,
    undo: UndoStack,
    stats: SessionStats,
    status: SessionStatus,
    rng: ChaCha8Rng,
    events: EventBus,
    daily_goal: u32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ReviewController {
    /// Select due cards in `scope` and open a session on them
    pub fn start(
        store: Arc<dyn StudyStore>,
        scope: StudyScope,
        now: DateTime<Utc>,
        config: &StudyConfig,
        events: EventBus,
    ) -> Result<Self> {
        let queue = SessionQueue::start(store.as_ref(), scope, now, config.session.max_cards)?;
        Ok(Self::new(store, queue, now, config, events))
    }

    /// Open a session on an existing queue
    pub fn new(
        store: Arc<dyn StudyStore>,
        queue: SessionQueue,
        now: DateTime<Utc>,
        config: &StudyConfig,
        events: EventBus,
    ) -> Self {
        let rng = match config.session.fuzz_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let status = if queue.is_complete() {
            SessionStatus::Complete
        } else {
            SessionStatus::Ready
        };
        tracing::info!(
            scope = %queue.scope(),
            cards = queue.len(),
            "Study session started"
        );

        Self {
            store,
            scheduler: FSRSScheduler::new(config.scheduler.clone()),
            undo: UndoStack::with_capacity(queue.len()),
            queue,
            stats: SessionStats::default(),
            status,
            rng,
            events,
            daily_goal: config.progress.daily_goal,
            started_at: now,
            completed_at: if status == SessionStatus::Complete {
                Some(now)
            } else {
                None
            },
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Card waiting for a grade
    pub fn current(&self) -> Option<&Card> {
        match self.status {
            SessionStatus::Ready => self.queue.current(),
            SessionStatus::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Share of the queue already graded, 0..=100
    pub fn progress_percent(&self) -> u32 {
        self.queue.progress_percent()
    }

    pub fn can_undo(&self) -> bool {
        self.queue.position() > 0 && !self.undo.is_empty()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            stats: self.stats,
            accuracy: self.stats.accuracy(),
            total_cards: self.queue.len(),
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    /// Outcome of each grade for the current card. Nothing is written and
    /// the session's random source is not advanced, so grading right after
    /// gives the previewed result.
    pub fn preview(&self, now: DateTime<Utc>) -> Option<PreviewResults> {
        self.current()
            .map(|card| self.scheduler.preview(&card.memory, now, &self.rng))
    }

    /// Grade the current card (1 = Again, 2 = Hard, 3 = Good, 4 = Easy)
    pub fn grade(&mut self, grade: i32, time_spent_ms: i64, now: DateTime<Utc>) -> Result<GradeOutcome> {
        let rating = Rating::from_i32(grade).ok_or(ReviewError::InvalidGrade(grade))?;
        let index = self.queue.position();
        let card = self.current().ok_or(ReviewError::SessionComplete)?;

        let snapshot = card.memory.clone();
        let mut rng = self.rng.clone();
        let result = self.scheduler.review(&snapshot, rating, now, &mut rng);
        let record = ReviewRecord::new(card, rating, time_spent_ms, now);

        self.store.commit_review(&result.memory, &record)?;

        // Durable from here on
        self.rng = rng;
        self.undo.push(UndoEntry {
            index,
            snapshot,
            rating,
            record_id: record.id.clone(),
        });
        self.queue.set_memory(index, result.memory.clone());
        self.stats.record(rating);
        self.queue.advance();

        tracing::info!(
            card_id = %record.card_id,
            rating = %rating,
            state = %result.memory.state,
            interval_days = result.interval_days,
            "Grade committed"
        );

        let aggregate = match progress::record_reviews(self.store.as_ref(), 1, now, self.daily_goal) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("Progress update failed after grade: {}", e);
                None
            }
        };
        self.events.publish(ReviewEvent::CardGraded {
            card_id: record.card_id.clone(),
            rating: rating.as_u8(),
            state: result.memory.state.to_string(),
            due: result.memory.due,
            total_reviewed: aggregate.as_ref().map(|p| p.total_reviewed),
            current_streak: aggregate.as_ref().map(|p| p.current_streak),
            timestamp: now,
        });

        let summary = if self.queue.is_complete() {
            self.status = SessionStatus::Complete;
            self.completed_at = Some(now);
            let summary = self.summary();
            tracing::info!(
                reviewed = summary.stats.reviewed,
                accuracy = summary.accuracy,
                "Study session complete"
            );
            self.events.publish(ReviewEvent::SessionCompleted {
                reviewed: summary.stats.reviewed,
                accuracy: summary.accuracy,
                timestamp: now,
            });
            Some(summary)
        } else {
            None
        };

        Ok(GradeOutcome {
            result,
            record,
            summary,
        })
    }

    /// Take back the most recent grade: delete its review record and restore
    /// the card's memory exactly. Progress and achievements are left as they
    /// are.
    ///
    /// Fails with [`ReviewError::NotFound`] and changes nothing when the
    /// card's latest review is not the one this session wrote.
    pub fn undo(&mut self, now: DateTime<Utc>) -> Result<UndoOutcome> {
        let position = self.queue.position();
        if position == 0 {
            return Err(ReviewError::NothingToUndo);
        }
        let entry = self.undo.peek().cloned().ok_or(ReviewError::NothingToUndo)?;
        let index = position - 1;
        let card_id = self
            .queue
            .get(index)
            .map(|c| c.id().to_string())
            .ok_or(ReviewError::NothingToUndo)?;

        let last = self
            .store
            .last_review_for_card(&card_id)?
            .ok_or_else(|| ReviewError::NotFound(format!("no review recorded for card {}", card_id)))?;
        if last.id != entry.record_id {
            tracing::warn!(
                card_id = %card_id,
                expected = %entry.record_id,
                found = %last.id,
                "Latest review was not written by this session, refusing to undo"
            );
            return Err(ReviewError::NotFound(format!(
                "review {} is no longer the latest for card {}",
                entry.record_id, card_id
            )));
        }

        self.store
            .rollback_review(&last.id, &entry.snapshot)
            .map_err(|e| match e {
                StorageError::NotFound(what) => ReviewError::NotFound(what),
                other => ReviewError::Persistence(other),
            })?;

        self.undo.pop();
        self.queue.retreat();
        self.queue.set_memory(index, entry.snapshot.clone());
        self.stats.unrecord(entry.rating);
        self.status = SessionStatus::Ready;
        self.completed_at = None;

        tracing::info!(card_id = %card_id, rating = %entry.rating, "Grade undone");
        self.events.publish(ReviewEvent::GradeUndone {
            card_id,
            timestamp: now,
        });

        Ok(UndoOutcome {
            restored: entry.snapshot,
            rating: entry.rating,
            record_id: last.id,
        })
    }

    /// Back to the first card of the same selection with fresh counters and
    /// no undo history
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.queue.restart();
        self.stats = SessionStats::default();
        self.undo.clear();
        self.started_at = now;
        if self.queue.is_complete() {
            self.status = SessionStatus::Complete;
            self.completed_at = Some(now);
        } else {
            self.status = SessionStatus::Ready;
            self.completed_at = None;
        }
        tracing::debug!(cards = self.queue.len(), "Study session restarted");
    }
}
