//! Input model: tools, modifier keys, and the gesture events the renderer reports.
//!
//! The renderer does its own hit-testing and dragging. What reaches the core
//! are completed gestures keyed by object id: a drag that started or ended, a
//! click, or a transformer commit covering several nodes at once.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::layers::{LayerObject, ObjectId};
use crate::units;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    /// Drag the canvas; objects are not selectable.
    Pan,
    /// Drop new plantings onto the plant layer.
    Place,
}

impl Tool {
    /// Whether clicks on objects change the selection.
    #[must_use]
    pub fn selects(self) -> bool {
        matches!(self, Self::Select)
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

/// Change applied by the transformer to one attached node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDelta {
    /// Translation in world pixels.
    pub dx: f64,
    pub dy: f64,
    /// Added rotation in degrees.
    pub rotation: f64,
    /// Multiplier applied to the current scale.
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for TransformDelta {
    fn default() -> Self {
        Self { dx: 0.0, dy: 0.0, rotation: 0.0, scale_x: 1.0, scale_y: 1.0 }
    }
}

impl TransformDelta {
    /// A pure translation.
    #[must_use]
    pub fn translate(dx: f64, dy: f64) -> Self {
        Self { dx, dy, ..Self::default() }
    }

    /// `obj` with this delta applied.
    ///
    /// Rotation is only rewritten (and normalized) when the delta rotates, so
    /// a pure move leaves the stored rotation untouched.
    #[must_use]
    pub fn applied_to(&self, obj: &LayerObject) -> LayerObject {
        let mut out = obj.clone();
        out.x += self.dx;
        out.y += self.dy;
        if self.rotation.abs() > 0.0 {
            out.rotation = units::normalize_rotation(obj.rotation + self.rotation);
        }
        out.scale_x *= self.scale_x;
        out.scale_y *= self.scale_y;
        out
    }
}

/// A completed gesture reported by the render surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// A node started being dragged.
    DragStart { id: ObjectId },
    /// A node was dropped at a new world position.
    DragEnd { id: ObjectId, x: f64, y: f64 },
    /// A node was clicked.
    Click { id: ObjectId, modifiers: Modifiers },
    /// Click on empty canvas.
    BackgroundClick,
    /// The transformer finished a move/rotate/scale of its attached nodes.
    TransformCommit { ids: Vec<ObjectId>, deltas: Vec<TransformDelta> },
}
