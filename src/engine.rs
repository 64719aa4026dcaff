//! Editing session: the one context object a host holds per open plan.
//!
//! DESIGN
//! ======
//! `EditorEngine` ties the store, the sync bridge and the selection
//! controller together and is the only surface the renderer talks to:
//! it reads [`EditorEngine::scene`], forwards gestures through
//! [`EditorEngine::handle`], and pumps sync traffic with
//! [`EditorEngine::take_sync_requests`] / [`EditorEngine::apply_sync_response`].
//!
//! Every tracked-state change that reaches the remote store (dispatch, undo,
//! redo) is handed to the bridge right after it is applied, so replayed
//! history persists exactly like a fresh edit. Collaborator broadcasts come
//! in through [`EditorEngine::apply_remote_action`] and bypass the history.
//! Nothing here awaits.
//!
//! A layer that failed to load is read-only: it is not drawn, so edits to it
//! would be invisible and would land on server content this client never saw.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use time::Date;
use tracing::{debug, info, trace, warn};

use crate::action::Action;
use crate::broadcast::{RemoteAction, RemoteChange, RemoteOutcome};
use crate::camera::{Bounds, Point, Stage};
use crate::config::EditorConfig;
use crate::error::ErrorCode;
use crate::history::{EntryId, History};
use crate::hydrate::Hydration;
use crate::input::{Gesture, Modifiers, Tool, TransformDelta};
use crate::layers::{LayerKind, LayerObject, LayerSettings, ObjectId, PlantingDetails};
use crate::render::{Scene, build_scene};
use crate::selection::{GestureOwner, SelectionController, SelectionPolicy};
use crate::state::{LayerStatus, Notice, TrackedState, UntrackedState};
use crate::store::EditorStore;
use crate::sync::{Resolution, SyncBridge, SyncPhase, SyncRequest, SyncResponse};

pub struct EditorEngine {
    store: EditorStore,
    bridge: SyncBridge,
    selection: SelectionController,
    config: EditorConfig,
}

impl Default for EditorEngine {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorEngine {
    /// An engine over an empty plan.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self::with_state(TrackedState::new(), config)
    }

    #[must_use]
    pub fn with_state(tracked: TrackedState, config: EditorConfig) -> Self {
        Self {
            store: EditorStore::new(tracked, &config),
            bridge: SyncBridge::new(),
            selection: SelectionController::default(),
            config,
        }
    }

    /// Swap in a freshly hydrated plan.
    ///
    /// History, outstanding sync requests and the selection are discarded.
    /// Each failed layer raises a notice.
    pub fn load(&mut self, hydration: Hydration) {
        let Hydration { tracked, status } = hydration;
        self.store.replace_tracked(tracked);
        self.bridge.reset();
        self.selection.clear();
        for (kind, layer_status) in &status {
            if let LayerStatus::Failed { code, message } = layer_status {
                self.notify(Notice { code: *code, message: format!("{kind} layer: {message}"), object_id: None });
            }
        }
        self.store.untracked_mut().layer_status = status;
        info!("plan loaded");
    }

    // --- Reads ---

    #[must_use]
    pub fn tracked(&self) -> &TrackedState {
        self.store.tracked()
    }

    #[must_use]
    pub fn untracked(&self) -> &UntrackedState {
        self.store.untracked()
    }

    #[must_use]
    pub fn history(&self) -> &History {
        self.store.history()
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Sync requests whose outcome is still outstanding.
    #[must_use]
    pub fn pending_sync_count(&self) -> usize {
        self.bridge.pending_count()
    }

    /// Snapshot for the renderer.
    #[must_use]
    pub fn scene(&self) -> Scene {
        build_scene(self.store.tracked(), self.store.untracked(), self.selection.attached())
    }

    // --- Tracked mutations ---

    /// Apply and record `action`, queueing its remote writes.
    ///
    /// Returns the history entry id, or `None` when nothing changed.
    pub fn dispatch(&mut self, action: Action) -> Option<EntryId> {
        let layer = action.layer();
        if self.layer_failed(layer) {
            warn!(%layer, action = action.name(), "edit of a layer that failed to load ignored");
            return None;
        }
        let entry = self.store.dispatch(action)?;
        self.bridge.track(Some(entry.id), &entry.forward, &entry.inverse);
        self.prune_selection();
        Some(entry.id)
    }

    /// Undo the latest step. Returns whether anything was undone.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.store.undo() else {
            return false;
        };
        // The entry now sits on the redo stack, which reverts never prune.
        self.bridge.track(None, &entry.inverse, &entry.forward);
        self.prune_selection();
        true
    }

    /// Redo the latest undone step. Returns whether anything was redone.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.store.redo() else {
            return false;
        };
        self.bridge.track(Some(entry.id), &entry.forward, &entry.inverse);
        self.prune_selection();
        true
    }

    /// Drop a new planting onto the plant layer and attach it.
    pub fn place_planting(&mut self, plant_id: i64, x: f64, y: f64, width: f64, height: f64) -> Option<EntryId> {
        let planting = LayerObject::planting(plant_id, x, y, width, height);
        let id = planting.id.clone();
        let entry = self.dispatch(Action::ObjectAdd { layer: LayerKind::Plant, objects: vec![planting] })?;
        if self.store.untracked().selected_layer == LayerKind::Plant {
            self.selection.set_attached(vec![id]);
        }
        Some(entry)
    }

    /// Remove every attached object from the selected layer.
    pub fn remove_attached(&mut self) -> Option<EntryId> {
        if self.selection.attached().is_empty() {
            return None;
        }
        let layer = self.store.untracked().selected_layer;
        let ids = self.selection.attached().to_vec();
        self.dispatch(Action::ObjectRemove { layer, ids })
    }

    /// Set the date range of a planting on the plant layer.
    pub fn set_planting_dates(&mut self, id: &str, add_date: Option<Date>, remove_date: Option<Date>) -> Option<EntryId> {
        let Some(current) = self.store.tracked().object(LayerKind::Plant, id) else {
            warn!(%id, "planting dates for unknown object ignored");
            return None;
        };
        let Some(planting) = &current.planting else {
            warn!(%id, "object has no planting details; dates ignored");
            return None;
        };
        let mut updated = current.clone();
        updated.planting = Some(PlantingDetails { add_date, remove_date, ..planting.clone() });
        self.dispatch(Action::ObjectUpdate { layer: LayerKind::Plant, objects: vec![updated] })
    }

    /// Replace the settings record of a layer. Settings stay local.
    pub fn update_layer_settings(&mut self, layer: LayerKind, settings: LayerSettings) -> Option<EntryId> {
        self.dispatch(Action::LayerSettingsUpdate { layer, settings })
    }

    // --- Untracked mutations ---

    /// Viewport provider hook.
    pub fn set_editor_bounds(&mut self, bounds: Bounds) {
        self.store.untracked_mut().editor_bounds = bounds;
    }

    /// The render surface was resized to `width` x `height` screen pixels.
    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        let untracked = self.store.untracked_mut();
        untracked.viewport_width = width;
        untracked.viewport_height = height;
        self.refresh_editor_bounds();
    }

    /// Adopt the stage transform reported by the scene graph.
    pub fn set_stage(&mut self, stage: Stage) {
        self.store.untracked_mut().stage = stage;
        self.refresh_editor_bounds();
    }

    pub fn pan_stage(&mut self, dx: f64, dy: f64) {
        self.store.untracked_mut().stage.pan_by(dx, dy);
        self.refresh_editor_bounds();
    }

    /// Zoom around the screen point `anchor` (usually the pointer).
    pub fn zoom_stage(&mut self, anchor: Point, factor: f64) {
        self.store.untracked_mut().stage.zoom_at(anchor, factor);
        self.refresh_editor_bounds();
    }

    /// The world point under a screen point.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.store.untracked().stage.to_world(screen)
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.store.untracked_mut().active_tool = tool;
    }

    /// Route gestures to `layer`. Clears the selection.
    pub fn select_layer(&mut self, layer: LayerKind) {
        if self.store.untracked().selected_layer != layer {
            self.selection.clear();
        }
        self.store.untracked_mut().selected_layer = layer;
    }

    pub fn set_timeline_date(&mut self, date: Option<Date>) {
        self.store.untracked_mut().timeline_date = date;
    }

    pub fn set_layer_visible(&mut self, layer: LayerKind, visible: bool) {
        self.store.untracked_mut().set_layer_visible(layer, visible);
    }

    pub fn set_selection_policy(&mut self, policy: Box<dyn SelectionPolicy>) {
        self.selection.set_policy(policy);
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.store.untracked_mut().notices)
    }

    // --- Gestures ---

    /// Translate a render-surface gesture. Returns the entry id when the
    /// gesture dispatched an action.
    pub fn handle(&mut self, gesture: Gesture) -> Option<EntryId> {
        match gesture {
            Gesture::DragStart { id } => {
                self.on_drag_start(&id);
                None
            }
            Gesture::DragEnd { id, x, y } => self.on_drag_end(&id, x, y),
            Gesture::Click { id, modifiers } => {
                self.on_click(&id, modifiers);
                None
            }
            Gesture::BackgroundClick => {
                self.selection.clear();
                None
            }
            Gesture::TransformCommit { ids, deltas } => self.on_transform_commit(&ids, &deltas),
        }
    }

    pub fn on_drag_start(&mut self, id: &str) {
        let owner = self.selection.drag_start(id);
        trace!(%id, ?owner, "drag start");
    }

    /// A node was dropped at `(x, y)`. Direct drags dispatch one update;
    /// transformer drags are left to the transform commit.
    pub fn on_drag_end(&mut self, id: &str, x: f64, y: f64) -> Option<EntryId> {
        if self.selection.drag_end(id) == GestureOwner::Transformer {
            trace!(%id, "drag end owned by transformer");
            return None;
        }
        let layer = self.store.untracked().selected_layer;
        let Some(current) = self.store.tracked().object(layer, id) else {
            warn!(%layer, %id, "drag end for unknown object ignored");
            return None;
        };
        let mut moved = current.clone();
        moved.x = x;
        moved.y = y;
        self.dispatch(Action::ObjectUpdate { layer, objects: vec![moved] })
    }

    pub fn on_click(&mut self, id: &str, modifiers: Modifiers) {
        if !self.store.untracked().active_tool.selects() {
            return;
        }
        let layer = self.store.untracked().selected_layer;
        if self.store.tracked().object(layer, id).is_none() {
            debug!(%layer, %id, "click on object outside the selected layer ignored");
            return;
        }
        self.selection.click(id, modifiers);
    }

    /// Commit a transformer gesture as a single update covering every node.
    pub fn on_transform_commit(&mut self, ids: &[ObjectId], deltas: &[TransformDelta]) -> Option<EntryId> {
        if ids.len() != deltas.len() {
            warn!(ids = ids.len(), deltas = deltas.len(), "transform commit with mismatched deltas ignored");
            return None;
        }
        let layer = self.store.untracked().selected_layer;
        let tracked = self.store.tracked();
        let objects: Vec<LayerObject> = ids
            .iter()
            .zip(deltas)
            .filter_map(|(id, delta)| match tracked.object(layer, id) {
                Some(current) => Some(delta.applied_to(current)),
                None => {
                    warn!(%layer, %id, "transform of unknown object skipped");
                    None
                }
            })
            .collect();
        if objects.is_empty() {
            return None;
        }
        self.dispatch(Action::ObjectUpdate { layer, objects })
    }

    // --- Sync ---

    /// Drain the requests the host must execute.
    pub fn take_sync_requests(&mut self) -> Vec<SyncRequest> {
        self.bridge.take_outbox()
    }

    /// Reconcile a remote outcome. Returns the phase the request ended in,
    /// or `None` for a response nobody was waiting for.
    pub fn apply_sync_response(&mut self, response: SyncResponse) -> Option<SyncPhase> {
        let resolution = self.bridge.resolve(response);
        let phase = resolution.phase();
        match resolution {
            Resolution::Confirmed { layer, object_id, canonical: Some(canonical) } => {
                if let Some(current) = self.store.tracked().object(layer, &object_id) {
                    let mut merged = current.clone();
                    merged.absorb(&canonical);
                    if self.store.apply_remote(&Action::ObjectUpdate { layer, objects: vec![merged] }) {
                        debug!(%layer, %object_id, "canonical object merged");
                    }
                }
            }
            Resolution::Revert { entry_id, restore, error } => {
                let object_id = restore.object_ids().into_iter().next();
                self.store.revert(entry_id, &restore);
                self.prune_selection();
                self.notify(Notice { code: error.error_code(), message: error.to_string(), object_id });
            }
            Resolution::Failed { object_id, error, .. } => {
                self.notify(Notice { code: error.error_code(), message: error.to_string(), object_id: Some(object_id) });
            }
            Resolution::Confirmed { canonical: None, .. } | Resolution::Superseded { .. } | Resolution::Unknown { .. } => {}
        }
        phase
    }

    // --- Collaboration ---

    /// Fold a collaborator's broadcast change into the local state.
    ///
    /// The change is applied outside the history. Echoes of our own writes
    /// are dropped, as are changes to objects with an unresolved local write:
    /// that write is newer from here and its confirmation brings the server
    /// state. Deletes always apply.
    pub fn apply_remote_action(&mut self, remote: &RemoteAction) -> RemoteOutcome {
        let RemoteAction { action_id, user_id, layer, change } = remote;
        if self.bridge.take_echo(*action_id) {
            trace!(%action_id, "own broadcast echo dropped");
            return RemoteOutcome::OwnEcho;
        }
        if layer.is_frontend_only() || self.layer_failed(*layer) {
            debug!(%layer, %action_id, "broadcast for an unavailable layer dropped");
            return RemoteOutcome::LayerUnavailable;
        }
        let shadowed = change.object_id().is_some_and(|id| self.bridge.is_pending(*layer, id));
        if shadowed && !matches!(change, RemoteChange::Delete { .. }) {
            debug!(%layer, id = ?change.object_id(), %action_id, "broadcast shadowed by a pending local write");
            return RemoteOutcome::LocalPending;
        }
        let Some(action) = change.to_action(*layer, self.store.tracked()) else {
            return RemoteOutcome::Unchanged;
        };
        if !self.store.apply_remote(&action) {
            return RemoteOutcome::Unchanged;
        }
        self.prune_selection();
        debug!(%layer, %user_id, %action_id, action = action.name(), "collaborator change applied");
        RemoteOutcome::Applied
    }

    fn layer_failed(&self, layer: LayerKind) -> bool {
        matches!(self.store.untracked().layer_status(layer), LayerStatus::Failed { .. })
    }

    fn refresh_editor_bounds(&mut self) {
        let untracked = self.store.untracked_mut();
        untracked.editor_bounds = untracked.stage.editor_bounds(untracked.viewport_width, untracked.viewport_height);
    }

    fn notify(&mut self, notice: Notice) {
        let capacity = self.config.notice_capacity;
        self.store.untracked_mut().push_notice(notice, capacity);
    }

    /// Keep the attached set in step with the selected layer's contents.
    fn prune_selection(&mut self) {
        let Some(layer) = self.store.tracked().layer(self.store.untracked().selected_layer) else {
            return;
        };
        self.selection.retain(|id| layer.contains(id));
    }
}
