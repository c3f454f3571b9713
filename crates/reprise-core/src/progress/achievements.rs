//! Achievements
//!
//! A fixed catalog unlocked by review totals and streak length. The tracker
//! listens on the event bus; the grading path never calls it directly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::events::ReviewEvent;
use crate::storage::{Result, StudyStore};

/// What an achievement measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "camelCase")]
pub enum Milestone {
    TotalReviews(u64),
    Streak(u32),
}

impl Milestone {
    fn reached(&self, total_reviewed: u64, current_streak: u32) -> bool {
        match *self {
            Milestone::TotalReviews(n) => total_reviewed >= n,
            Milestone::Streak(n) => current_streak >= n,
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub milestone: Milestone,
}

/// Every achievement, in display order
pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_review",
        name: "First Steps",
        description: "Review your first card",
        milestone: Milestone::TotalReviews(1),
    },
    Achievement {
        id: "reviews_100",
        name: "Centurion",
        description: "Review 100 cards",
        milestone: Milestone::TotalReviews(100),
    },
    Achievement {
        id: "reviews_500",
        name: "Dedicated",
        description: "Review 500 cards",
        milestone: Milestone::TotalReviews(500),
    },
    Achievement {
        id: "reviews_1000",
        name: "Scholar",
        description: "Review 1000 cards",
        milestone: Milestone::TotalReviews(1000),
    },
    Achievement {
        id: "streak_3",
        name: "On a Roll",
        description: "Study 3 days in a row",
        milestone: Milestone::Streak(3),
    },
    Achievement {
        id: "streak_7",
        name: "Week Warrior",
        description: "Study 7 days in a row",
        milestone: Milestone::Streak(7),
    },
    Achievement {
        id: "streak_30",
        name: "Unstoppable",
        description: "Study 30 days in a row",
        milestone: Milestone::Streak(30),
    },
];

/// Look up a catalog entry
pub fn achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Unlocks achievements and records them in the store
pub struct AchievementTracker<'a> {
    store: &'a dyn StudyStore,
}

impl<'a> AchievementTracker<'a> {
    pub fn new(store: &'a dyn StudyStore) -> Self {
        Self { store }
    }

    /// Unlock everything the counters reach. Returns only entries that were
    /// not unlocked before.
    pub fn evaluate(
        &self,
        total_reviewed: u64,
        current_streak: u32,
        at: DateTime<Utc>,
    ) -> Result<Vec<&'static Achievement>> {
        let mut unlocked = Vec::new();
        for entry in ACHIEVEMENTS {
            if entry.milestone.reached(total_reviewed, current_streak)
                && self.store.unlock_achievement(entry.id, at)?
            {
                tracing::info!(achievement = entry.id, "Achievement unlocked");
                unlocked.push(entry);
            }
        }
        Ok(unlocked)
    }

    /// React to one event
    pub fn handle(&self, event: &ReviewEvent) -> Result<Vec<&'static Achievement>> {
        match event {
            ReviewEvent::CardGraded {
                total_reviewed: Some(total),
                current_streak: Some(streak),
                timestamp,
                ..
            } => self.evaluate(*total, *streak, *timestamp),
            _ => Ok(Vec::new()),
        }
    }

    /// Process every event already queued on `rx` without blocking
    pub fn drain(
        &self,
        rx: &mut broadcast::Receiver<ReviewEvent>,
    ) -> Result<Vec<&'static Achievement>> {
        let mut unlocked = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => unlocked.extend(self.handle(&event)?),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Achievement tracker lagged behind event bus");
                }
                Err(_) => break,
            }
        }
        Ok(unlocked)
    }
}
