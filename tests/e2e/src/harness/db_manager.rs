//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded databases with test cards
//! - Reopening the same file to check durability

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reprise_core::{
    Card, CardMemory, EventBus, ReviewController, SqliteStore, StudyConfig, StudyScope, StudyStore,
};
use tempfile::TempDir;

use crate::mocks::TestDataFactory;

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// let cards = db.seed_new_cards("spanish", 5, now);
/// let mut session = db.start_session(StudyScope::All, now);
/// ```
pub struct TestDatabaseManager {
    /// The store, shared so sessions can hold it
    pub store: Arc<SqliteStore>,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
    /// Config used for sessions
    pub config: StudyConfig,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory, with a fixed fuzz seed
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_reprise.db");
        let store = SqliteStore::new(Some(db_path.clone())).expect("Failed to create test store");

        let mut config = StudyConfig::default();
        config.session.fuzz_seed = Some(2024);

        Self {
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
            db_path,
            config,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Open a second, independent store on the same file
    pub fn reopen(&self) -> SqliteStore {
        SqliteStore::new(Some(self.db_path.clone())).expect("Failed to reopen test store")
    }

    /// Shared handle as the trait object sessions take
    pub fn dyn_store(&self) -> Arc<dyn StudyStore> {
        self.store.clone()
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Insert `count` never-studied cards, due one minute apart before `now`
    pub fn seed_new_cards(&self, deck: &str, count: usize, now: DateTime<Utc>) -> Vec<Card> {
        let cards = TestDataFactory::new_cards(deck, count, now);
        for card in &cards {
            self.store.insert_card(card).expect("Failed to insert card");
        }
        cards
    }

    /// Insert one card with the given memory
    pub fn seed_card_with_memory(&self, deck: &str, memory: CardMemory, now: DateTime<Utc>) -> Card {
        let card = TestDataFactory::card_with_memory(deck, memory, now);
        self.store.insert_card(&card).expect("Failed to insert card");
        card
    }

    // ========================================================================
    // SESSIONS
    // ========================================================================

    /// Start a session with the manager's config and a private event bus
    pub fn start_session(&self, scope: StudyScope, now: DateTime<Utc>) -> ReviewController {
        self.start_session_with_bus(scope, now, EventBus::default())
    }

    pub fn start_session_with_bus(
        &self,
        scope: StudyScope,
        now: DateTime<Utc>,
        bus: EventBus,
    ) -> ReviewController {
        ReviewController::start(self.dyn_store(), scope, now, &self.config, bus)
            .expect("Failed to start session")
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    /// Current stored memory of a card
    pub fn memory(&self, card_id: &str) -> CardMemory {
        self.store
            .get_card(card_id)
            .expect("Failed to read card")
            .expect("Card missing")
            .memory
    }

    /// Number of review records
    pub fn review_count(&self) -> i64 {
        self.store.count_reviews(None).unwrap_or(0)
    }
}
