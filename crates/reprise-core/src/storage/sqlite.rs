//! SQLite Storage Implementation
//!
//! Cards, the review log, and the progress aggregate in one database file.

use chrono::{DateTime, NaiveDate, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::store::{CardStats, Result, StorageError, StudyStore, UnlockedAchievement};
use crate::fsrs::Rating;
use crate::memory::{Card, CardMemory, LearningState, ReviewRecord};
use crate::progress::UserProgress;
use crate::session::StudyScope;

const CARD_COLUMNS: &str = "id, deck_id, front, back, due, stability, difficulty, elapsed_days, \
     scheduled_days, reps, lapses, state, last_review, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, card_id, deck_id, grade, time_spent_ms, reviewed_at";

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed [`StudyStore`]
///
/// Uses separate reader/writer connections for interior mutability, so all
/// methods take `&self` and the store can be shared behind an `Arc`.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        // Apply encryption key if SQLCipher is enabled and key is provided
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("REPRISE_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Default database location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "reprise", "core").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join("reprise.db"))
    }

    /// Open (creating if needed) the database at `db_path`, or at
    /// [`default_path`](Self::default_path) when `None`
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(parent, perms);
                }
            }
        }

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        tracing::debug!(path = %path.display(), "Opened study database");

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Location of the database file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    fn row_to_card(row: &Row) -> rusqlite::Result<Card> {
        let state_text: String = row.get(11)?;
        let state = state_text
            .parse::<LearningState>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, e.into()))?;
        let last_review: Option<i64> = row.get(12)?;

        Ok(Card {
            deck_id: row.get(1)?,
            front: row.get(2)?,
            back: row.get(3)?,
            created_at: millis_to_datetime(13, row.get(13)?)?,
            updated_at: millis_to_datetime(14, row.get(14)?)?,
            memory: CardMemory {
                id: row.get(0)?,
                due: millis_to_datetime(4, row.get(4)?)?,
                stability: row.get(5)?,
                difficulty: row.get(6)?,
                elapsed_days: row.get(7)?,
                scheduled_days: row.get(8)?,
                reps: row.get(9)?,
                lapses: row.get(10)?,
                state,
                last_review: last_review
                    .map(|ms| millis_to_datetime(12, ms))
                    .transpose()?,
            },
        })
    }

    fn row_to_review(row: &Row) -> rusqlite::Result<ReviewRecord> {
        let grade: u8 = row.get(3)?;
        let rating = Rating::try_from(grade).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Integer,
                format!("grade {} outside 1..=4", grade).into(),
            )
        })?;

        Ok(ReviewRecord {
            id: row.get(0)?,
            card_id: row.get(1)?,
            deck_id: row.get(2)?,
            rating,
            time_spent_ms: row.get(4)?,
            reviewed_at: millis_to_datetime(5, row.get(5)?)?,
        })
    }

    /// Write memory fields in `conn`; false if the card does not exist
    fn write_memory(conn: &Connection, memory: &CardMemory, updated_at: DateTime<Utc>) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE cards SET
                due = ?2, stability = ?3, difficulty = ?4, elapsed_days = ?5,
                scheduled_days = ?6, reps = ?7, lapses = ?8, state = ?9,
                last_review = ?10, updated_at = ?11
             WHERE id = ?1",
            params![
                memory.id,
                memory.due.timestamp_millis(),
                memory.stability,
                memory.difficulty,
                memory.elapsed_days,
                memory.scheduled_days,
                memory.reps,
                memory.lapses,
                memory.state.as_str(),
                memory.last_review.map(|t| t.timestamp_millis()),
                updated_at.timestamp_millis(),
            ],
        )?;
        Ok(changed > 0)
    }

    fn insert_review(conn: &Connection, record: &ReviewRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO reviews (id, card_id, deck_id, grade, time_spent_ms, reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.card_id,
                record.deck_id,
                record.rating.as_u8(),
                record.time_spent_ms,
                record.reviewed_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }
}

fn millis_to_datetime(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {} out of range", ms).into(),
        )
    })
}

/// Reject rows that break the memory invariants
fn checked(card: Card) -> Result<Card> {
    card.memory
        .validate()
        .map_err(|e| StorageError::InvalidData(format!("card {}: {}", card.id(), e)))?;
    Ok(card)
}

fn scope_deck(scope: &StudyScope) -> Option<&str> {
    match scope {
        StudyScope::All => None,
        StudyScope::Deck(id) => Some(id.as_str()),
    }
}

// ============================================================================
// STUDY STORE
// ============================================================================

impl StudyStore for SqliteStore {
    fn insert_card(&self, card: &Card) -> Result<()> {
        card.memory
            .validate()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;
        let writer = self.writer()?;
        let memory = &card.memory;
        writer.execute(
            "INSERT INTO cards (
                id, deck_id, front, back, due, stability, difficulty, elapsed_days,
                scheduled_days, reps, lapses, state, last_review, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                memory.id,
                card.deck_id,
                card.front,
                card.back,
                memory.due.timestamp_millis(),
                memory.stability,
                memory.difficulty,
                memory.elapsed_days,
                memory.scheduled_days,
                memory.reps,
                memory.lapses,
                memory.state.as_str(),
                memory.last_review.map(|t| t.timestamp_millis()),
                card.created_at.timestamp_millis(),
                card.updated_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn get_card(&self, id: &str) -> Result<Option<Card>> {
        let reader = self.reader()?;
        let card = reader
            .query_row(
                &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
                params![id],
                Self::row_to_card,
            )
            .optional()?;
        card.map(checked).transpose()
    }

    fn due_cards(&self, scope: &StudyScope, now: DateTime<Utc>, limit: usize) -> Result<Vec<Card>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM cards
             WHERE due <= ?1 AND (?2 IS NULL OR deck_id = ?2)
             ORDER BY
                CASE state
                    WHEN 'new' THEN 0
                    WHEN 'learning' THEN 1
                    WHEN 'relearning' THEN 2
                    ELSE 3
                END,
                due ASC,
                created_at ASC,
                id ASC
             LIMIT ?3",
            CARD_COLUMNS
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let cards = stmt
            .query_map(
                params![now.timestamp_millis(), scope_deck(scope), limit],
                Self::row_to_card,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        cards.into_iter().map(checked).collect()
    }

    fn update_memory(&self, memory: &CardMemory) -> Result<()> {
        let writer = self.writer()?;
        if !Self::write_memory(&writer, memory, Utc::now())? {
            return Err(StorageError::NotFound(memory.id.clone()));
        }
        Ok(())
    }

    fn card_stats(&self, scope: &StudyScope, now: DateTime<Utc>) -> Result<CardStats> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT state, COUNT(*), COALESCE(SUM(CASE WHEN due <= ?1 THEN 1 ELSE 0 END), 0)
             FROM cards
             WHERE (?2 IS NULL OR deck_id = ?2)
             GROUP BY state",
        )?;
        let rows = stmt
            .query_map(params![now.timestamp_millis(), scope_deck(scope)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stats = CardStats::default();
        for (state, count, due) in rows {
            let state = state
                .parse::<LearningState>()
                .map_err(|e| StorageError::InvalidData(e.to_string()))?;
            match state {
                LearningState::New => stats.new += count,
                LearningState::Learning | LearningState::Relearning => stats.learning += count,
                LearningState::Review => stats.review += count,
            }
            stats.total += count;
            stats.due += due;
        }
        Ok(stats)
    }

    fn last_review_for_card(&self, card_id: &str) -> Result<Option<ReviewRecord>> {
        let reader = self.reader()?;
        let record = reader
            .query_row(
                &format!(
                    "SELECT {} FROM reviews WHERE card_id = ?1
                     ORDER BY reviewed_at DESC, rowid DESC LIMIT 1",
                    REVIEW_COLUMNS
                ),
                params![card_id],
                Self::row_to_review,
            )
            .optional()?;
        Ok(record)
    }

    fn append_review(&self, record: &ReviewRecord) -> Result<()> {
        let writer = self.writer()?;
        Self::insert_review(&writer, record)
    }

    fn delete_review(&self, record_id: &str) -> Result<()> {
        let writer = self.writer()?;
        let changed = writer.execute("DELETE FROM reviews WHERE id = ?1", params![record_id])?;
        if changed == 0 {
            return Err(StorageError::NotFound(record_id.to_string()));
        }
        Ok(())
    }

    fn count_reviews(&self, card_id: Option<&str>) -> Result<i64> {
        let reader = self.reader()?;
        let count = reader.query_row(
            "SELECT COUNT(*) FROM reviews WHERE (?1 IS NULL OR card_id = ?1)",
            params![card_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_reviews_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let reader = self.reader()?;
        let count = reader.query_row(
            "SELECT COUNT(*) FROM reviews WHERE reviewed_at >= ?1",
            params![since.timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn commit_review(&self, memory: &CardMemory, record: &ReviewRecord) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        if !Self::write_memory(&tx, memory, record.reviewed_at)? {
            return Err(StorageError::NotFound(memory.id.clone()));
        }
        Self::insert_review(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    fn rollback_review(&self, record_id: &str, snapshot: &CardMemory) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        let deleted = tx.execute("DELETE FROM reviews WHERE id = ?1", params![record_id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound(record_id.to_string()));
        }
        if !Self::write_memory(&tx, snapshot, Utc::now())? {
            return Err(StorageError::NotFound(snapshot.id.clone()));
        }
        tx.commit()?;
        Ok(())
    }

    fn load_progress(&self) -> Result<Option<UserProgress>> {
        let reader = self.reader()?;
        let row = reader
            .query_row(
                "SELECT total_reviewed, current_streak, longest_streak, last_study_date,
                        reviewed_today, daily_goal
                 FROM user_progress WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, u32>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((total, current, longest, last_date, today, goal)) = row else {
            return Ok(None);
        };
        let last_study_date = last_date
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| StorageError::InvalidData(format!("last_study_date {}: {}", s, e)))
            })
            .transpose()?;

        Ok(Some(UserProgress {
            total_reviewed: u64::try_from(total)
                .map_err(|_| StorageError::InvalidData(format!("total_reviewed {}", total)))?,
            current_streak: current,
            longest_streak: longest,
            last_study_date,
            reviewed_today: today,
            daily_goal: goal,
        }))
    }

    fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        let total = i64::try_from(progress.total_reviewed).map_err(|_| {
            StorageError::InvalidData(format!("total_reviewed {}", progress.total_reviewed))
        })?;
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO user_progress (
                id, total_reviewed, current_streak, longest_streak, last_study_date,
                reviewed_today, daily_goal
             ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                total_reviewed = excluded.total_reviewed,
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                last_study_date = excluded.last_study_date,
                reviewed_today = excluded.reviewed_today,
                daily_goal = excluded.daily_goal",
            params![
                total,
                progress.current_streak,
                progress.longest_streak,
                progress.last_study_date.map(|d| d.format("%Y-%m-%d").to_string()),
                progress.reviewed_today,
                progress.daily_goal,
            ],
        )?;
        Ok(())
    }

    fn unlocked_achievements(&self) -> Result<Vec<UnlockedAchievement>> {
        let reader = self.reader()?;
        let mut stmt =
            reader.prepare("SELECT id, unlocked_at FROM achievements ORDER BY unlocked_at, id")?;
        let unlocked = stmt
            .query_map([], |row| {
                Ok(UnlockedAchievement {
                    id: row.get(0)?,
                    unlocked_at: millis_to_datetime(1, row.get(1)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(unlocked)
    }

    fn unlock_achievement(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let writer = self.writer()?;
        let changed = writer.execute(
            "INSERT OR IGNORE INTO achievements (id, unlocked_at) VALUES (?1, ?2)",
            params![id, at.timestamp_millis()],
        )?;
        Ok(changed > 0)
    }
}
