//! Transformer attachment and gesture ownership.
//!
//! The controller is the only writer of the attached set (the nodes under
//! the multi-object manipulation handle). It also decides who owns a drag:
//! a node dragged on its own is a direct move and dispatches a single
//! update, while a node dragged as part of the transformer is committed once
//! for all attached nodes by the transform-commit gesture. Ownership is
//! fixed when the drag starts, so attaching or detaching a node mid-drag
//! cannot make one gesture dispatch twice.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::HashMap;

use tracing::trace;

use crate::input::Modifiers;
use crate::layers::ObjectId;

/// Decides the attached set after a click.
pub trait SelectionPolicy: Send {
    /// The new attached set after `id` is clicked with `modifiers`.
    fn click(&self, attached: &[ObjectId], id: &str, modifiers: Modifiers) -> Vec<ObjectId>;
}

impl<F> SelectionPolicy for F
where
    F: Fn(&[ObjectId], &str, Modifiers) -> Vec<ObjectId> + Send,
{
    fn click(&self, attached: &[ObjectId], id: &str, modifiers: Modifiers) -> Vec<ObjectId> {
        self(attached, id, modifiers)
    }
}

/// Clicking an unattached node makes it the only attached node; clicking an
/// attached node keeps the set as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceSelection;

impl SelectionPolicy for ReplaceSelection {
    fn click(&self, attached: &[ObjectId], id: &str, _modifiers: Modifiers) -> Vec<ObjectId> {
        if attached.iter().any(|a| a == id) {
            attached.to_vec()
        } else {
            vec![id.to_string()]
        }
    }
}

/// Like [`ReplaceSelection`], but shift-click toggles membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftToggleSelection;

impl SelectionPolicy for ShiftToggleSelection {
    fn click(&self, attached: &[ObjectId], id: &str, modifiers: Modifiers) -> Vec<ObjectId> {
        if !modifiers.shift {
            return ReplaceSelection.click(attached, id, modifiers);
        }
        if attached.iter().any(|a| a == id) {
            attached.iter().filter(|a| *a != id).cloned().collect()
        } else {
            let mut next = attached.to_vec();
            next.push(id.to_string());
            next
        }
    }
}

/// Who is responsible for committing a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOwner {
    /// The node moves on its own; its drag end dispatches an update.
    Direct,
    /// The transformer commits the move for every attached node.
    Transformer,
}

pub struct SelectionController {
    attached: Vec<ObjectId>,
    policy: Box<dyn SelectionPolicy>,
    drags: HashMap<ObjectId, GestureOwner>,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(Box::new(ReplaceSelection))
    }
}

impl std::fmt::Debug for SelectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionController")
            .field("attached", &self.attached)
            .field("drags", &self.drags)
            .finish_non_exhaustive()
    }
}

impl SelectionController {
    #[must_use]
    pub fn new(policy: Box<dyn SelectionPolicy>) -> Self {
        Self { attached: Vec::new(), policy, drags: HashMap::new() }
    }

    pub fn set_policy(&mut self, policy: Box<dyn SelectionPolicy>) {
        self.policy = policy;
    }

    /// Attached ids in attachment order.
    #[must_use]
    pub fn attached(&self) -> &[ObjectId] {
        &self.attached
    }

    #[must_use]
    pub fn is_attached(&self, id: &str) -> bool {
        self.attached.iter().any(|a| a == id)
    }

    /// Apply the selection policy to a click on `id`.
    pub fn click(&mut self, id: &str, modifiers: Modifiers) {
        let mut next = self.policy.click(&self.attached, id, modifiers);
        dedup_in_order(&mut next);
        trace!(%id, attached = next.len(), "selection changed");
        self.attached = next;
    }

    pub fn clear(&mut self) {
        self.attached.clear();
    }

    /// Replace the attached set outright.
    pub fn set_attached(&mut self, ids: Vec<ObjectId>) {
        let mut ids = ids;
        dedup_in_order(&mut ids);
        self.attached = ids;
    }

    /// Drop `ids` from the attached set and forget their drags.
    pub fn detach(&mut self, ids: &[ObjectId]) {
        self.attached.retain(|a| !ids.contains(a));
        for id in ids {
            self.drags.remove(id);
        }
    }

    /// Keep only attached ids for which `exists` holds.
    pub fn retain(&mut self, exists: impl Fn(&str) -> bool) {
        self.attached.retain(|a| exists(a));
        self.drags.retain(|id, _| exists(id));
    }

    /// Record who owns the drag of `id`, based on attachment right now.
    pub fn drag_start(&mut self, id: &str) -> GestureOwner {
        let owner = self.owner_now(id);
        self.drags.insert(id.to_string(), owner);
        owner
    }

    /// Consume the drag owner recorded at drag start. Falls back to current
    /// attachment when no start was seen.
    pub fn drag_end(&mut self, id: &str) -> GestureOwner {
        self.drags.remove(id).unwrap_or_else(|| self.owner_now(id))
    }

    fn owner_now(&self, id: &str) -> GestureOwner {
        if self.is_attached(id) { GestureOwner::Transformer } else { GestureOwner::Direct }
    }
}

fn dedup_in_order(ids: &mut Vec<ObjectId>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}
