//! The editing state store: single mutation gateway and history manager.
//!
//! DESIGN
//! ======
//! `EditorStore` owns the tracked and untracked state of one editing session.
//! Tracked state only changes through [`EditorStore::dispatch`],
//! [`EditorStore::undo`], [`EditorStore::redo`] and the two reconciliation
//! paths used by the sync bridge ([`EditorStore::revert`] and
//! [`EditorStore::apply_remote`]). Every call runs to completion
//! synchronously; nothing here awaits.
//!
//! Untracked state is handed out mutably through
//! [`EditorStore::untracked_mut`]; changes there never reach the history.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use tracing::{debug, trace};

use crate::action::{Action, Plan};
use crate::config::EditorConfig;
use crate::history::{EntryId, History, HistoryEntry};
use crate::layers::ObjectId;
use crate::state::{TrackedState, UntrackedState};

pub struct EditorStore {
    tracked: TrackedState,
    untracked: UntrackedState,
    history: History,
    next_entry_id: EntryId,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new(TrackedState::new(), &EditorConfig::default())
    }
}

impl EditorStore {
    /// Create a store around a hydrated state.
    #[must_use]
    pub fn new(tracked: TrackedState, config: &EditorConfig) -> Self {
        Self {
            tracked,
            untracked: UntrackedState::default(),
            history: History::new(config.history_limit),
            next_entry_id: 1,
        }
    }

    // --- Reads ---

    #[must_use]
    pub fn tracked(&self) -> &TrackedState {
        &self.tracked
    }

    #[must_use]
    pub fn untracked(&self) -> &UntrackedState {
        &self.untracked
    }

    /// Direct access to the ephemeral UI state. Never recorded in history.
    pub fn untracked_mut(&mut self) -> &mut UntrackedState {
        &mut self.untracked
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    // --- Mutations ---

    /// Apply `action` and record it for undo. Clears the redo stack.
    ///
    /// Returns the recorded entry, or `None` when the action changed nothing
    /// (in which case nothing is recorded and the redo stack is kept).
    pub fn dispatch(&mut self, action: Action) -> Option<HistoryEntry> {
        let Some(Plan { forward, inverse }) = action.plan(&self.tracked) else {
            debug!(action = action.name(), layer = %action.layer(), "dispatch had no effect");
            return None;
        };
        forward.apply(&mut self.tracked);

        let entry = HistoryEntry { id: self.next_entry_id, forward, inverse };
        self.next_entry_id += 1;
        trace!(entry = entry.id, action = entry.forward.name(), "dispatched");
        self.history.record(entry.clone());
        Some(entry)
    }

    /// Revert the most recent step. No-op when there is nothing to undo.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.history.pop_past()?;
        entry.inverse.apply(&mut self.tracked);
        trace!(entry = entry.id, action = entry.inverse.name(), "undo");
        self.history.push_future(entry.clone());
        Some(entry)
    }

    /// Re-apply the most recently undone step. No-op when there is nothing to redo.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.history.pop_future()?;
        entry.forward.apply(&mut self.tracked);
        trace!(entry = entry.id, action = entry.forward.name(), "redo");
        self.history.push_past(entry.clone());
        Some(entry)
    }

    /// Roll back a rejected edit.
    ///
    /// Applies `restore` without recording it, then strips the restored
    /// objects from history entry `entry_id` (if it is still on the past
    /// stack) so a later undo does not replay the rejected edit. Returns
    /// whether anything changed.
    pub fn revert(&mut self, entry_id: Option<EntryId>, restore: &Action) -> bool {
        let ids: Vec<ObjectId> = restore.object_ids();
        if let Some(entry_id) = entry_id {
            if self.history.prune(entry_id, &ids) {
                debug!(entry = entry_id, objects = ids.len(), "pruned reverted objects from history");
            }
        }
        self.apply_remote(restore)
    }

    /// Apply authoritative data from the remote store without recording it.
    ///
    /// Returns whether anything changed.
    pub fn apply_remote(&mut self, action: &Action) -> bool {
        let Some(plan) = action.plan(&self.tracked) else {
            return false;
        };
        plan.forward.apply(&mut self.tracked);
        true
    }

    /// Swap in a freshly loaded plan. History is cleared; untracked state is kept.
    pub fn replace_tracked(&mut self, tracked: TrackedState) {
        self.tracked = tracked;
        self.history.clear();
    }
}
