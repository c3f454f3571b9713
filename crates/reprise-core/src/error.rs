//! Session errors

use crate::storage::StorageError;

/// Broad error category, for callers deciding between retry and abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing changed, retry with corrected input
    Validation,
    /// Stored data does not match the session's history
    NotFound,
    /// The store failed; the session stays where it was
    Persistence,
}

/// Grading and undo failures
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Invalid grade {0}: expected 1 (Again), 2 (Hard), 3 (Good) or 4 (Easy)")]
    InvalidGrade(i32),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Session is complete")]
    SessionComplete,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::InvalidGrade(_)
            | ReviewError::NothingToUndo
            | ReviewError::SessionComplete => ErrorKind::Validation,
            ReviewError::NotFound(_) => ErrorKind::NotFound,
            ReviewError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, ReviewError>;
