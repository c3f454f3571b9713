//! Bounded undo history

use crate::fsrs::Rating;
use crate::memory::CardMemory;

/// Pre-grade snapshot of one grading action
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    /// Queue index of the graded card
    pub index: usize,
    /// Memory exactly as it was before the grade
    pub snapshot: CardMemory,
    /// Grade that was applied
    pub rating: Rating,
    /// Review record written by the grade
    pub record_id: String,
}

/// Last-in first-out snapshots, at most `capacity` deep
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
    capacity: usize,
}

impl UndoStack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a snapshot, dropping the oldest one when full
    pub fn push(&mut self, entry: UndoEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
