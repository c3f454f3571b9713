//! Progress aggregate and achievements
//!
//! Both sit outside the undo boundary: undoing a grade restores the card but
//! leaves these counters as they are.

mod achievements;
mod streak;

pub use achievements::{achievement, Achievement, AchievementTracker, Milestone, ACHIEVEMENTS};
pub use streak::{record_reviews, UserProgress};
