//! Reversible actions on the tracked state.
//!
//! DESIGN
//! ======
//! Every mutation of [`TrackedState`] is an [`Action`]. Before an action is
//! applied it is *planned* against the current state: the plan trims the
//! action down to what it actually changes and captures the inverse from the
//! pre-mutation state. Because the inverse is captured up front, undo and
//! redo never need to re-read anything after the fact, and applying
//! `inverse` then `forward` lands on an identical state.
//!
//! Actions that reference unknown objects are not errors: the offending
//! entries are dropped with a warning and the rest of the action proceeds.

#[cfg(test)]
#[path = "action_test.rs"]
mod action_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layers::{IndexedObject, Layer, LayerKind, LayerObject, LayerSettings, ObjectId};
use crate::state::TrackedState;

/// A reversible edit of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Append new objects.
    ObjectAdd { layer: LayerKind, objects: Vec<LayerObject> },
    /// Replace existing objects by id, keeping their position in the layer.
    ObjectUpdate { layer: LayerKind, objects: Vec<LayerObject> },
    /// Remove objects by id.
    ObjectRemove { layer: LayerKind, ids: Vec<ObjectId> },
    /// Re-insert removed objects at their former indices.
    ObjectRestore { layer: LayerKind, entries: Vec<IndexedObject> },
    /// Replace the layer's settings record.
    LayerSettingsUpdate { layer: LayerKind, settings: LayerSettings },
}

/// An action trimmed to its effect, paired with its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub forward: Action,
    pub inverse: Action,
}

impl Action {
    /// The layer this action edits.
    #[must_use]
    pub fn layer(&self) -> LayerKind {
        match self {
            Self::ObjectAdd { layer, .. }
            | Self::ObjectUpdate { layer, .. }
            | Self::ObjectRemove { layer, .. }
            | Self::ObjectRestore { layer, .. }
            | Self::LayerSettingsUpdate { layer, .. } => *layer,
        }
    }

    /// Wire name of the action, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ObjectAdd { .. } => "OBJECT_ADD",
            Self::ObjectUpdate { .. } => "OBJECT_UPDATE",
            Self::ObjectRemove { .. } => "OBJECT_REMOVE",
            Self::ObjectRestore { .. } => "OBJECT_RESTORE",
            Self::LayerSettingsUpdate { .. } => "LAYER_SETTINGS_UPDATE",
        }
    }

    /// Ids of the objects this action touches, in payload order.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        match self {
            Self::ObjectAdd { objects, .. } | Self::ObjectUpdate { objects, .. } => {
                objects.iter().map(|o| o.id.clone()).collect()
            }
            Self::ObjectRemove { ids, .. } => ids.clone(),
            Self::ObjectRestore { entries, .. } => entries.iter().map(|e| e.object.id.clone()).collect(),
            Self::LayerSettingsUpdate { .. } => Vec::new(),
        }
    }

    /// Trim this action to its effect on `state` and capture the inverse.
    ///
    /// Returns `None` when applying the action would change nothing.
    #[must_use]
    pub fn plan(&self, state: &TrackedState) -> Option<Plan> {
        let kind = self.layer();
        let Some(layer) = state.layer(kind) else {
            warn!(layer = %kind, action = self.name(), "action targets a missing layer; ignored");
            return None;
        };
        match self {
            Self::ObjectAdd { objects, .. } => plan_add(layer, objects),
            Self::ObjectUpdate { objects, .. } => plan_update(layer, objects),
            Self::ObjectRemove { ids, .. } => plan_remove(layer, ids),
            Self::ObjectRestore { entries, .. } => plan_restore(layer, entries),
            Self::LayerSettingsUpdate { settings, .. } => {
                if layer.settings == *settings {
                    return None;
                }
                Some(Plan {
                    forward: self.clone(),
                    inverse: Self::LayerSettingsUpdate { layer: kind, settings: layer.settings.clone() },
                })
            }
        }
    }

    /// Apply this action to `state`.
    ///
    /// Planned actions apply exactly; anything that no longer fits the state
    /// (an id that vanished, a duplicate insert) is skipped with a warning.
    pub fn apply(&self, state: &mut TrackedState) {
        let kind = self.layer();
        let Some(layer) = state.layer_mut(kind) else {
            warn!(layer = %kind, action = self.name(), "action targets a missing layer; ignored");
            return;
        };
        match self {
            Self::ObjectAdd { objects, .. } => {
                for obj in objects {
                    if !layer.insert(obj.clone()) {
                        warn!(layer = %kind, id = %obj.id, "object id already taken; add skipped");
                    }
                }
            }
            Self::ObjectUpdate { objects, .. } => {
                for id in layer.update_existing(objects.iter().cloned()) {
                    warn!(layer = %kind, %id, "update for unknown object dropped");
                }
            }
            Self::ObjectRemove { ids, .. } => {
                layer.remove(ids);
            }
            Self::ObjectRestore { entries, .. } => layer.restore(entries.iter().cloned()),
            Self::LayerSettingsUpdate { settings, .. } => layer.settings = settings.clone(),
        }
    }

    /// The part of this action that concerns object `id`.
    #[must_use]
    pub fn restricted_to(&self, id: &str) -> Option<Self> {
        self.filter_objects(|oid| oid == id)
    }

    /// This action with the objects in `ids` dropped.
    #[must_use]
    pub fn without(&self, ids: &[ObjectId]) -> Option<Self> {
        self.filter_objects(|oid| !ids.iter().any(|i| i == oid))
    }

    /// Keep only the objects whose id satisfies `keep`; `None` if none remain.
    /// Settings updates are not object-scoped and are never kept.
    fn filter_objects(&self, keep: impl Fn(&str) -> bool) -> Option<Self> {
        let filtered = match self {
            Self::ObjectAdd { layer, objects } => Self::ObjectAdd {
                layer: *layer,
                objects: objects.iter().filter(|o| keep(&o.id)).cloned().collect(),
            },
            Self::ObjectUpdate { layer, objects } => Self::ObjectUpdate {
                layer: *layer,
                objects: objects.iter().filter(|o| keep(&o.id)).cloned().collect(),
            },
            Self::ObjectRemove { layer, ids } => Self::ObjectRemove {
                layer: *layer,
                ids: ids.iter().filter(|i| keep(i)).cloned().collect(),
            },
            Self::ObjectRestore { layer, entries } => Self::ObjectRestore {
                layer: *layer,
                entries: entries.iter().filter(|e| keep(&e.object.id)).cloned().collect(),
            },
            Self::LayerSettingsUpdate { .. } => return None,
        };
        (!filtered.object_ids().is_empty()).then_some(filtered)
    }
}

fn plan_add(layer: &Layer, objects: &[LayerObject]) -> Option<Plan> {
    let mut seen = HashSet::new();
    let mut added = Vec::new();
    for obj in objects {
        if obj.layer_kind != layer.kind {
            warn!(layer = %layer.kind, id = %obj.id, object_layer = %obj.layer_kind, "object belongs to another layer; add skipped");
            continue;
        }
        if layer.contains(&obj.id) || !seen.insert(obj.id.as_str()) {
            warn!(layer = %layer.kind, id = %obj.id, "object id already taken; add skipped");
            continue;
        }
        added.push(obj.clone());
    }
    if added.is_empty() {
        return None;
    }
    let ids = added.iter().map(|o| o.id.clone()).collect();
    Some(Plan {
        forward: Action::ObjectAdd { layer: layer.kind, objects: added },
        inverse: Action::ObjectRemove { layer: layer.kind, ids },
    })
}

fn plan_update(layer: &Layer, objects: &[LayerObject]) -> Option<Plan> {
    // A later entry for the same id supersedes an earlier one.
    let mut latest: Vec<&LayerObject> = Vec::with_capacity(objects.len());
    for obj in objects {
        latest.retain(|o| o.id != obj.id);
        latest.push(obj);
    }

    let mut next = Vec::new();
    let mut previous = Vec::new();
    for obj in latest {
        let Some(current) = layer.get(&obj.id) else {
            warn!(layer = %layer.kind, id = %obj.id, "update for unknown object dropped");
            continue;
        };
        if obj.layer_kind != layer.kind {
            warn!(layer = %layer.kind, id = %obj.id, object_layer = %obj.layer_kind, "object belongs to another layer; update skipped");
            continue;
        }
        if current == obj {
            continue;
        }
        previous.push(current.clone());
        next.push(obj.clone());
    }
    if next.is_empty() {
        return None;
    }
    Some(Plan {
        forward: Action::ObjectUpdate { layer: layer.kind, objects: next },
        inverse: Action::ObjectUpdate { layer: layer.kind, objects: previous },
    })
}

fn plan_remove(layer: &Layer, ids: &[ObjectId]) -> Option<Plan> {
    let mut entries: Vec<IndexedObject> = Vec::new();
    for id in ids {
        if entries.iter().any(|e| e.object.id == *id) {
            continue;
        }
        match layer.index_of(id) {
            Some(index) => entries.push(IndexedObject { index, object: layer.objects()[index].clone() }),
            None => debug!(layer = %layer.kind, %id, "remove for absent object ignored"),
        }
    }
    if entries.is_empty() {
        return None;
    }
    entries.sort_by_key(|e| e.index);
    let ids = entries.iter().map(|e| e.object.id.clone()).collect();
    Some(Plan {
        forward: Action::ObjectRemove { layer: layer.kind, ids },
        inverse: Action::ObjectRestore { layer: layer.kind, entries },
    })
}

fn plan_restore(layer: &Layer, entries: &[IndexedObject]) -> Option<Plan> {
    let mut seen = HashSet::new();
    let mut restored: Vec<IndexedObject> = entries
        .iter()
        .filter(|e| !layer.contains(&e.object.id) && seen.insert(e.object.id.as_str()))
        .cloned()
        .collect();
    if restored.is_empty() {
        return None;
    }
    restored.sort_by_key(|e| e.index);
    let ids = restored.iter().map(|e| e.object.id.clone()).collect();
    Some(Plan {
        forward: Action::ObjectRestore { layer: layer.kind, entries: restored },
        inverse: Action::ObjectRemove { layer: layer.kind, ids },
    })
}
