//! Daily streak and review totals

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DAILY_GOAL;
use crate::storage::{Result, StudyStore};

/// Learner-wide progress counters, outside any single session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub total_reviewed: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// UTC calendar day of the most recent review
    pub last_study_date: Option<NaiveDate>,
    /// Reviews on `last_study_date`
    pub reviewed_today: u32,
    pub daily_goal: u32,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            total_reviewed: 0,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
            reviewed_today: 0,
            daily_goal: DEFAULT_DAILY_GOAL,
        }
    }
}

impl UserProgress {
    /// Fresh counters with a custom goal
    pub fn with_goal(daily_goal: u32) -> Self {
        Self {
            daily_goal,
            ..Self::default()
        }
    }

    /// Count `count` reviews on `today`.
    ///
    /// Same day adds to today's count. The following day extends the streak;
    /// any longer gap starts a new streak of 1. Dates earlier than the last
    /// study date only add to the totals.
    pub fn record_reviews(&mut self, count: u32, today: NaiveDate) {
        if count == 0 {
            return;
        }
        self.total_reviewed += u64::from(count);

        match self.last_study_date {
            Some(last) if last == today => {
                self.reviewed_today += count;
            }
            Some(last) if last > today => {}
            Some(last) if last.succ_opt() == Some(today) => {
                self.current_streak += 1;
                self.reviewed_today = count;
                self.last_study_date = Some(today);
            }
            _ => {
                self.current_streak = 1;
                self.reviewed_today = count;
                self.last_study_date = Some(today);
            }
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }

    /// Streak as seen on `today`: zero once a whole day has been missed
    pub fn streak_on(&self, today: NaiveDate) -> u32 {
        match self.last_study_date {
            Some(last) if last == today || last.succ_opt() == Some(today) => self.current_streak,
            _ => 0,
        }
    }

    /// Reviews counted toward the goal on `today`
    pub fn reviewed_on(&self, today: NaiveDate) -> u32 {
        if self.last_study_date == Some(today) {
            self.reviewed_today
        } else {
            0
        }
    }

    /// Whether the daily goal is met on `today`
    pub fn goal_met(&self, today: NaiveDate) -> bool {
        self.reviewed_on(today) >= self.daily_goal
    }
}

/// Read-modify-write the stored aggregate for `count` reviews at `now`
pub fn record_reviews(
    store: &dyn StudyStore,
    count: u32,
    now: DateTime<Utc>,
    daily_goal: u32,
) -> Result<UserProgress> {
    let mut progress = store
        .load_progress()?
        .unwrap_or_else(|| UserProgress::with_goal(daily_goal));
    progress.daily_goal = daily_goal;
    progress.record_reviews(count, now.date_naive());
    store.save_progress(&progress)?;
    Ok(progress)
}
