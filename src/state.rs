//! Tracked and untracked editor state.
//!
//! DESIGN
//! ======
//! The editor keeps two independent structures. [`TrackedState`] is the
//! serializable plan content and the unit of undo/redo; it only changes
//! through [`crate::store::EditorStore`]. [`UntrackedState`] is ephemeral UI
//! context (viewport, tool, load status, notices) with its own direct
//! mutation path; it is never recorded in history and never serialized.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::camera::{Bounds, Stage};
use crate::input::Tool;
use crate::layers::{Layer, LayerKind, LayerObject, ObjectId};

// =============================================================================
// TRACKED STATE
// =============================================================================

/// The undo-tracked plan content: one layer per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedState {
    layers: BTreeMap<LayerKind, Layer>,
}

impl Default for TrackedState {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedState {
    /// A state with every layer present and empty.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: LayerKind::ALL.iter().map(|k| (*k, Layer::new(*k))).collect() }
    }

    /// Build a state from loaded layers; kinds not supplied start empty.
    #[must_use]
    pub fn from_layers(layers: impl IntoIterator<Item = Layer>) -> Self {
        let mut state = Self::new();
        for layer in layers {
            state.layers.insert(layer.kind, layer);
        }
        state
    }

    #[must_use]
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.get(&kind)
    }

    pub(crate) fn layer_mut(&mut self, kind: LayerKind) -> Option<&mut Layer> {
        self.layers.get_mut(&kind)
    }

    /// Layers in stacking order, bottom first.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    #[must_use]
    pub fn object(&self, kind: LayerKind, id: &str) -> Option<&LayerObject> {
        self.layer(kind).and_then(|l| l.get(id))
    }
}

// =============================================================================
// UNTRACKED STATE
// =============================================================================

/// Load outcome of a single layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerStatus {
    /// Not loaded yet.
    Pending,
    /// Hydrated with the given number of objects.
    Loaded { objects: usize },
    /// Hydration failed; the layer is empty but the rest of the plan is usable.
    Failed { code: &'static str, message: String },
}

/// A transient, user-visible message (e.g. a rejected edit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: &'static str,
    pub message: String,
    pub object_id: Option<ObjectId>,
}

/// Ephemeral UI context. Never undo-tracked.
#[derive(Debug, Clone)]
pub struct UntrackedState {
    /// Current viewport in world pixels, as reported by the viewport provider
    /// or derived from `stage` and the viewport size.
    pub editor_bounds: Bounds,
    pub stage: Stage,
    /// Render surface size in screen pixels.
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub active_tool: Tool,
    /// Layer that receives gestures.
    pub selected_layer: LayerKind,
    /// Date the plan is viewed at; plantings outside their date range are hidden.
    pub timeline_date: Option<Date>,
    pub hidden_layers: Vec<LayerKind>,
    pub layer_status: BTreeMap<LayerKind, LayerStatus>,
    pub notices: Vec<Notice>,
}

impl Default for UntrackedState {
    fn default() -> Self {
        Self {
            editor_bounds: Bounds::default(),
            stage: Stage::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            active_tool: Tool::default(),
            selected_layer: LayerKind::Plant,
            timeline_date: None,
            hidden_layers: Vec::new(),
            layer_status: LayerKind::ALL.iter().map(|k| (*k, LayerStatus::Pending)).collect(),
            notices: Vec::new(),
        }
    }
}

impl UntrackedState {
    #[must_use]
    pub fn is_layer_visible(&self, kind: LayerKind) -> bool {
        !self.hidden_layers.contains(&kind)
    }

    pub fn set_layer_visible(&mut self, kind: LayerKind, visible: bool) {
        self.hidden_layers.retain(|k| *k != kind);
        if !visible {
            self.hidden_layers.push(kind);
        }
    }

    #[must_use]
    pub fn layer_status(&self, kind: LayerKind) -> &LayerStatus {
        self.layer_status.get(&kind).unwrap_or(&LayerStatus::Pending)
    }

    /// Queue a notice, dropping the oldest beyond `capacity`.
    pub fn push_notice(&mut self, notice: Notice, capacity: usize) {
        self.notices.push(notice);
        if self.notices.len() > capacity {
            let excess = self.notices.len() - capacity;
            self.notices.drain(..excess);
        }
    }
}
