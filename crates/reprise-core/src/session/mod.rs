//! Study sessions
//!
//! A [`SessionQueue`] freezes the due cards at start; the
//! [`ReviewController`] grades them in order and can take back the most
//! recent grade.

mod controller;
mod queue;
mod stats;
mod undo;

pub use controller::{GradeOutcome, ReviewController, SessionStatus, UndoOutcome};
pub use queue::{SessionQueue, StudyScope};
pub use stats::{SessionStats, SessionSummary};
pub use undo::{UndoEntry, UndoStack};
