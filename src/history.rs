//! Undo/redo history: a bounded past deque and a future stack.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::layers::ObjectId;

/// Identifier of a history entry, unique for the lifetime of a store.
pub type EntryId = u64;

/// One undoable step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub forward: Action,
    pub inverse: Action,
}

/// Past and future stacks with an optional cap on the past.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    limit: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(None)
    }
}

impl History {
    /// Create a history keeping at most `limit` past entries (`None` = unbounded).
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self { past: VecDeque::new(), future: Vec::new(), limit }
    }

    /// Record a new step. Clears the future.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.future.clear();
        self.push_past(entry);
    }

    /// Push onto the past without touching the future (redo replay).
    pub fn push_past(&mut self, entry: HistoryEntry) {
        self.past.push_back(entry);
        if let Some(limit) = self.limit {
            while self.past.len() > limit {
                self.past.pop_front();
            }
        }
    }

    pub fn pop_past(&mut self) -> Option<HistoryEntry> {
        self.past.pop_back()
    }

    pub fn push_future(&mut self, entry: HistoryEntry) {
        self.future.push(entry);
    }

    pub fn pop_future(&mut self) -> Option<HistoryEntry> {
        self.future.pop()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Past entries, oldest first.
    pub fn past(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.past.iter()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Drop `ids` from the past entry `entry_id`.
    ///
    /// The entry disappears entirely once no objects are left in it. Returns
    /// whether the entry was found.
    pub fn prune(&mut self, entry_id: EntryId, ids: &[ObjectId]) -> bool {
        let Some(pos) = self.past.iter().position(|e| e.id == entry_id) else {
            return false;
        };
        let entry = &self.past[pos];
        match (entry.forward.without(ids), entry.inverse.without(ids)) {
            (Some(forward), Some(inverse)) => {
                self.past[pos] = HistoryEntry { id: entry_id, forward, inverse };
            }
            _ => {
                self.past.remove(pos);
            }
        }
        true
    }
}
