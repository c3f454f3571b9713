//! # Reprise Core
//!
//! Spaced-repetition engine for offline flashcard study:
//!
//! - **FSRS scheduling**: difficulty / stability / retrievability model with a
//!   configurable 16-weight vector, four learning states and seeded interval fuzz
//! - **Study sessions**: frozen due queue, grading with an exact single-step undo
//! - **Storage**: SQLite with versioned migrations, or an in-memory store
//! - **Progress**: daily streaks, review totals and achievements, driven by events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chrono::Utc;
//! use reprise_core::{Card, EventBus, NewCard, ReviewController, SqliteStore, StudyConfig, StudyScope, StudyStore};
//!
//! let store = Arc::new(SqliteStore::new(None)?);
//! store.insert_card(&Card::from_input(
//!     NewCard { deck_id: "spanish".into(), front: "hola".into(), back: "hello".into() },
//!     Utc::now(),
//! ))?;
//!
//! let config = StudyConfig::default();
//! let mut session = ReviewController::start(store, StudyScope::All, Utc::now(), &config, EventBus::default())?;
//! while session.current().is_some() {
//!     session.grade(3, 2_000, Utc::now())?;
//! }
//! session.undo(Utc::now())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary
//! - `encryption`: SQLCipher, keyed from `REPRISE_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod error;
pub mod events;
pub mod fsrs;
pub mod memory;
pub mod progress;
pub mod session;
pub mod storage;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{ConfigError, ProgressConfig, SessionConfig, StudyConfig};

pub use error::{ErrorKind, ReviewError};

pub use events::{EventBus, ReviewEvent};

pub use fsrs::{
    format_interval, next_state, schedule_review, FSRSParameters, FSRSScheduler, PreviewResults,
    Rating, ReviewResult, DEFAULT_RETENTION, DEFAULT_WEIGHTS,
};

pub use memory::{Card, CardMemory, InvariantViolation, LearningState, NewCard, ReviewRecord};

pub use progress::{Achievement, AchievementTracker, UserProgress, ACHIEVEMENTS};

pub use session::{
    GradeOutcome, ReviewController, SessionQueue, SessionStats, SessionStatus, SessionSummary,
    StudyScope, UndoOutcome,
};

pub use storage::{
    CardStats, InMemoryStore, Result, SqliteStore, StorageError, StudyStore, UnlockedAchievement,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of memory-model weights the scheduler takes
pub const FSRS_WEIGHT_COUNT: usize = fsrs::WEIGHT_COUNT;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Card, CardMemory, EventBus, FSRSParameters, FSRSScheduler, LearningState, NewCard, Rating,
        ReviewController, ReviewError, SqliteStore, StorageError, StudyConfig, StudyScope,
        StudyStore,
    };
}
