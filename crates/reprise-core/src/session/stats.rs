//! Per-session counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::Rating;

/// Grades given during the current pass over the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub reviewed: u32,
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl SessionStats {
    fn counter(&mut self, rating: Rating) -> &mut u32 {
        match rating {
            Rating::Again => &mut self.again,
            Rating::Hard => &mut self.hard,
            Rating::Good => &mut self.good,
            Rating::Easy => &mut self.easy,
        }
    }

    pub fn record(&mut self, rating: Rating) {
        self.reviewed += 1;
        *self.counter(rating) += 1;
    }

    /// Reverse one [`record`](Self::record)
    pub fn unrecord(&mut self, rating: Rating) {
        self.reviewed = self.reviewed.saturating_sub(1);
        let counter = self.counter(rating);
        *counter = counter.saturating_sub(1);
    }

    pub fn count(&self, rating: Rating) -> u32 {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }

    /// (good + easy) / reviewed, 0 before any review
    pub fn accuracy(&self) -> f64 {
        if self.reviewed == 0 {
            return 0.0;
        }
        f64::from(self.good + self.easy) / f64::from(self.reviewed)
    }

    /// Accuracy as a rounded percentage
    pub fn accuracy_percent(&self) -> u32 {
        (self.accuracy() * 100.0).round() as u32
    }
}

/// Terminal report for a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub stats: SessionStats,
    pub accuracy: f64,
    pub total_cards: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}
