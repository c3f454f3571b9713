//! Review events
//!
//! The controller publishes one event per committed grade or undo on a tokio
//! broadcast channel. Observers (achievements, UIs) subscribe independently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Default channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something that happened in a study session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ReviewEvent {
    CardGraded {
        card_id: String,
        rating: u8,
        state: String,
        due: DateTime<Utc>,
        /// Aggregate after this grade; absent if the aggregate update failed
        total_reviewed: Option<u64>,
        current_streak: Option<u32>,
        timestamp: DateTime<Utc>,
    },
    GradeUndone {
        card_id: String,
        timestamp: DateTime<Utc>,
    },
    SessionCompleted {
        reviewed: u32,
        accuracy: f64,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast hub for [`ReviewEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ReviewEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers. Returns how many received it; zero
    /// subscribers is fine.
    pub fn publish(&self, event: ReviewEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
