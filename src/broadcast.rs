//! Changes made by other collaborators on the same plan.
//!
//! The server broadcasts every accepted write to all clients on the map,
//! stamped with the writer's user id and the client-minted action id of the
//! request. A broadcast is folded into local state outside the history, so
//! a collaborator's edit is never undone by this client's undo.

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod broadcast_test;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::action::Action;
use crate::layers::{LayerKind, LayerObject, LayerSettings, ObjectId, ObjectPatch};
use crate::state::TrackedState;
use crate::sync::ActionId;

/// One broadcast write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAction {
    pub action_id: ActionId,
    pub user_id: Uuid,
    pub layer: LayerKind,
    pub change: RemoteChange,
}

/// What the collaborator changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteChange {
    /// A new object, or the full state of an existing one.
    Create(LayerObject),
    /// Changed fields of an existing object (moves, transforms, planting dates).
    Update { id: ObjectId, patch: ObjectPatch },
    Delete { id: ObjectId },
    /// A replaced settings record (the base layer image).
    Settings(LayerSettings),
}

/// How [`crate::engine::EditorEngine::apply_remote_action`] handled a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Folded into the local state.
    Applied,
    /// The echo of one of our own writes.
    OwnEcho,
    /// The object has an unresolved local write, which is newer from this
    /// client's point of view; the broadcast is dropped.
    LocalPending,
    /// The layer is frontend-only or failed to load.
    LayerUnavailable,
    /// Nothing to change (unknown object, or already in that state).
    Unchanged,
}

impl RemoteChange {
    /// The object the change targets, if any.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        match self {
            Self::Create(object) => Some(&object.id),
            Self::Update { id, .. } | Self::Delete { id } => Some(id),
            Self::Settings(_) => None,
        }
    }

    /// Express the change as an action against `state`.
    ///
    /// Creating an object that already exists replaces it. Updates of unknown
    /// objects and objects of another layer yield `None`.
    #[must_use]
    pub fn to_action(&self, layer: LayerKind, state: &TrackedState) -> Option<Action> {
        match self {
            Self::Create(object) => {
                if object.layer_kind != layer {
                    debug!(%layer, id = %object.id, object_layer = %object.layer_kind, "broadcast object on another layer");
                    return None;
                }
                let objects = vec![object.clone()];
                if state.object(layer, &object.id).is_some() {
                    Some(Action::ObjectUpdate { layer, objects })
                } else {
                    Some(Action::ObjectAdd { layer, objects })
                }
            }
            Self::Update { id, patch } => {
                let Some(current) = state.object(layer, id) else {
                    debug!(%layer, %id, "broadcast update for unknown object");
                    return None;
                };
                let mut updated = current.clone();
                patch.apply_to(&mut updated);
                Some(Action::ObjectUpdate { layer, objects: vec![updated] })
            }
            Self::Delete { id } => Some(Action::ObjectRemove { layer, ids: vec![id.clone()] }),
            Self::Settings(settings) => Some(Action::LayerSettingsUpdate { layer, settings: settings.clone() }),
        }
    }
}
