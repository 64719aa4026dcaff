//! Optimistic sync bridge: per-object sequencing of remote writes.
//!
//! DESIGN
//! ======
//! Local edits are applied immediately; the bridge then turns each touched
//! object into a [`SyncRequest`] and parks it in an outbox. The host (or
//! [`crate::remote::SyncDriver`]) executes requests in any order and feeds
//! [`SyncResponse`]s back through [`SyncBridge::resolve`].
//!
//! Every request gets a sequence number from one monotonically increasing
//! counter, and the bridge remembers the latest number issued per
//! `(layer, object)`. A response only counts when it answers the latest
//! request for its object; anything older is superseded and dropped, so a
//! slow success can never overwrite a newer local edit and a slow failure can
//! never roll one back.
//!
//! Request phases:
//!
//! ```text
//! Applied --take_outbox--> Pending --resolve--> Confirmed | Reverted
//!    \______________________/
//!      newer request for the same object --> Superseded
//! ```
//!
//! Each request also carries a fresh [`ActionId`]. The server stamps it on
//! the change it broadcasts to collaborators, and the bridge remembers the
//! ids it minted so the echo of our own write is recognized and dropped.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::consts::OWN_ACTION_MEMORY;
use crate::error::RemoteError;
use crate::history::EntryId;
use crate::layers::{LayerKind, LayerObject, ObjectId, ObjectPatch};

/// Sequence number of a sync request.
pub type SyncSeq = u64;

/// Client-minted id of one remote write, echoed back in collaborator broadcasts.
pub type ActionId = Uuid;

/// The remote write a request performs.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    /// Persist a new (or restored) object.
    Create(LayerObject),
    /// Position-only change.
    Move { x: f64, y: f64 },
    /// Any other change; only the differing fields are sent.
    Transform(ObjectPatch),
    /// Delete the object.
    Delete,
}

impl SyncOp {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Move { .. } => "move",
            Self::Transform(_) => "transform",
            Self::Delete => "delete",
        }
    }
}

/// One remote write awaiting execution.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    pub seq: SyncSeq,
    pub action_id: ActionId,
    pub layer: LayerKind,
    pub object_id: ObjectId,
    pub op: SyncOp,
}

/// Outcome of a [`SyncRequest`]. `Ok(Some(_))` carries the canonical object
/// as stored by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResponse {
    pub seq: SyncSeq,
    pub object_id: ObjectId,
    pub result: Result<Option<LayerObject>, RemoteError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Applied locally, request still in the outbox.
    Applied,
    /// Handed to the transport.
    Pending,
    Confirmed,
    Reverted,
    /// A newer request for the same object was issued.
    Superseded,
}

/// What the caller must do with a resolved response.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The server accepted the write. Merge `canonical` when present.
    Confirmed { layer: LayerKind, object_id: ObjectId, canonical: Option<LayerObject> },
    /// The server rejected the write. Apply `restore` through
    /// [`crate::store::EditorStore::revert`].
    Revert { entry_id: Option<EntryId>, restore: Action, error: RemoteError },
    /// The write failed but there is nothing to roll back.
    Failed { layer: LayerKind, object_id: ObjectId, error: RemoteError },
    /// A newer request for the same object exists; the response is dropped.
    Superseded { seq: SyncSeq },
    /// No request with this sequence number is outstanding.
    Unknown { seq: SyncSeq },
}

impl Resolution {
    /// Phase the request ended in, if it was known.
    #[must_use]
    pub fn phase(&self) -> Option<SyncPhase> {
        match self {
            Self::Confirmed { .. } => Some(SyncPhase::Confirmed),
            Self::Revert { .. } | Self::Failed { .. } => Some(SyncPhase::Reverted),
            Self::Superseded { .. } => Some(SyncPhase::Superseded),
            Self::Unknown { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    layer: LayerKind,
    object_id: ObjectId,
    entry_id: Option<EntryId>,
    restore: Option<Action>,
    phase: SyncPhase,
}

/// Sequencing state for every outstanding remote write.
#[derive(Debug, Default)]
pub struct SyncBridge {
    next_seq: SyncSeq,
    latest: HashMap<(LayerKind, ObjectId), SyncSeq>,
    in_flight: BTreeMap<SyncSeq, InFlight>,
    outbox: Vec<SyncRequest>,
    /// Action ids we issued whose broadcast echo has not been seen yet.
    own_actions: VecDeque<ActionId>,
}

impl SyncBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue requests for an action that was just applied locally.
    ///
    /// `applied` is what changed the state (a dispatched forward, an undo's
    /// inverse, a redo's forward) and `reverse` is the action that undoes it.
    /// `entry_id` names the history entry to prune if a request is rejected.
    /// Returns the number of requests queued.
    pub fn track(&mut self, entry_id: Option<EntryId>, applied: &Action, reverse: &Action) -> usize {
        let layer = applied.layer();
        if layer.is_frontend_only() {
            return 0;
        }
        let ops = sync_ops(applied, reverse);
        let queued = ops.len();
        for (object_id, op) in ops {
            self.next_seq += 1;
            let seq = self.next_seq;
            if let Some(prev) = self.latest.insert((layer, object_id.clone()), seq) {
                if let Some(flight) = self.in_flight.get_mut(&prev) {
                    trace!(seq = prev, %object_id, "superseded");
                    flight.phase = SyncPhase::Superseded;
                }
            }
            self.in_flight.insert(
                seq,
                InFlight {
                    layer,
                    object_id: object_id.clone(),
                    entry_id,
                    restore: reverse.restricted_to(&object_id),
                    phase: SyncPhase::Applied,
                },
            );
            let action_id = Uuid::new_v4();
            self.remember(action_id);
            debug!(seq, %layer, %object_id, op = op.name(), %action_id, "sync queued");
            self.outbox.push(SyncRequest { seq, action_id, layer, object_id, op });
        }
        queued
    }

    /// Drain the outbox. Returned requests move to [`SyncPhase::Pending`].
    pub fn take_outbox(&mut self) -> Vec<SyncRequest> {
        let requests = std::mem::take(&mut self.outbox);
        for request in &requests {
            if let Some(flight) = self.in_flight.get_mut(&request.seq) {
                if flight.phase == SyncPhase::Applied {
                    flight.phase = SyncPhase::Pending;
                }
            }
        }
        requests
    }

    /// Match a response against the latest request for its object.
    pub fn resolve(&mut self, response: SyncResponse) -> Resolution {
        let seq = response.seq;
        let Some(flight) = self.in_flight.remove(&seq) else {
            warn!(seq, object_id = %response.object_id, "response for unknown sync request");
            return Resolution::Unknown { seq };
        };

        let key = (flight.layer, flight.object_id);
        if self.latest.get(&key) != Some(&seq) {
            debug!(seq, object_id = %key.1, "stale sync response dropped");
            return Resolution::Superseded { seq };
        }
        self.latest.remove(&key);
        let (layer, object_id) = key;

        match response.result {
            Ok(canonical) => {
                debug!(seq, %layer, %object_id, "sync confirmed");
                Resolution::Confirmed { layer, object_id, canonical }
            }
            Err(error) => match flight.restore {
                Some(restore) => {
                    warn!(seq, %layer, %object_id, error = %error, "sync rejected; reverting");
                    Resolution::Revert { entry_id: flight.entry_id, restore, error }
                }
                None => {
                    warn!(seq, %layer, %object_id, error = %error, "sync rejected with nothing to revert");
                    Resolution::Failed { layer, object_id, error }
                }
            },
        }
    }

    /// Current phase of an outstanding request.
    #[must_use]
    pub fn phase(&self, seq: SyncSeq) -> Option<SyncPhase> {
        self.in_flight.get(&seq).map(|f| f.phase)
    }

    /// Outstanding requests that can still confirm or revert.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.latest.len()
    }

    /// Whether the latest write for an object is still unresolved.
    #[must_use]
    pub fn is_pending(&self, layer: LayerKind, object_id: &str) -> bool {
        self.latest.contains_key(&(layer, object_id.to_string()))
    }

    /// Whether a broadcast with `action_id` is the echo of one of our own
    /// writes. An echo is recognized once; the id is forgotten afterwards.
    pub fn take_echo(&mut self, action_id: ActionId) -> bool {
        let Some(pos) = self.own_actions.iter().position(|id| *id == action_id) else {
            return false;
        };
        self.own_actions.remove(pos);
        true
    }

    /// Forget every outstanding request (the plan was reloaded).
    ///
    /// Minted action ids are kept so late echoes are still recognized.
    pub fn reset(&mut self) {
        self.latest.clear();
        self.in_flight.clear();
        self.outbox.clear();
    }

    /// Writes that fail are never echoed, so only the newest ids are kept.
    fn remember(&mut self, action_id: ActionId) {
        if self.own_actions.len() == OWN_ACTION_MEMORY {
            self.own_actions.pop_front();
        }
        self.own_actions.push_back(action_id);
    }
}

/// Remote writes implied by `applied`, one per touched object.
fn sync_ops(applied: &Action, reverse: &Action) -> Vec<(ObjectId, SyncOp)> {
    match applied {
        Action::ObjectAdd { objects, .. } => {
            objects.iter().map(|o| (o.id.clone(), SyncOp::Create(o.clone()))).collect()
        }
        Action::ObjectRestore { entries, .. } => {
            entries.iter().map(|e| (e.object.id.clone(), SyncOp::Create(e.object.clone()))).collect()
        }
        Action::ObjectRemove { ids, .. } => ids.iter().map(|id| (id.clone(), SyncOp::Delete)).collect(),
        Action::ObjectUpdate { objects, .. } => {
            let previous: &[LayerObject] = match reverse {
                Action::ObjectUpdate { objects, .. } => objects,
                _ => &[],
            };
            objects
                .iter()
                .filter_map(|after| {
                    let Some(before) = previous.iter().find(|p| p.id == after.id) else {
                        warn!(id = %after.id, "update without a previous version; not synced");
                        return None;
                    };
                    let patch = ObjectPatch::between(before, after);
                    if patch.is_empty() {
                        return None;
                    }
                    let op = if patch.is_position_only() {
                        SyncOp::Move { x: after.x, y: after.y }
                    } else {
                        SyncOp::Transform(patch)
                    };
                    Some((after.id.clone(), op))
                })
                .collect()
        }
        Action::LayerSettingsUpdate { .. } => Vec::new(),
    }
}
