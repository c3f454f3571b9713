//! Storage Module
//!
//! The [`StudyStore`] contract plus two backends:
//! - SQLite with versioned migrations and transactional grade/undo pairs
//! - An in-memory fake for tests and embedders

mod memory;
mod migrations;
mod sqlite;
mod store;

pub use memory::InMemoryStore;
pub use migrations::{apply_migrations, get_current_version, Migration, MIGRATIONS};
pub use sqlite::SqliteStore;
pub use store::{CardStats, Result, StorageError, StudyStore, UnlockedAchievement};
