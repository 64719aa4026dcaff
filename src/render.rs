//! Scene snapshot: everything the renderer needs to draw one frame.
//!
//! Built from read-only views of the tracked state, the untracked state and
//! the attached set. It holds plain geometry and styling data only; the
//! scene graph that turns it into pixels lives outside this crate.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use crate::grid::{self, GridGeometry, Yardstick};
use crate::layers::{LayerKind, LayerObject, ObjectId};
use crate::state::{LayerStatus, TrackedState, UntrackedState};

/// Background image of the base layer, drawn centered on the world origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseImage {
    /// File store path, without a leading slash.
    pub path: String,
    /// Uniform scale mapping image pixels onto canvas pixels.
    pub scale: f64,
    /// Rotation in degrees.
    pub rotation: f64,
}

/// One drawable layer object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub id: ObjectId,
    pub layer: LayerKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Under the transformer handle.
    pub attached: bool,
    /// Accepts direct drags.
    pub draggable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub base_image: Option<BaseImage>,
    pub grid: Option<GridGeometry>,
    pub yardstick: Option<Yardstick>,
    /// Nodes in stacking order, bottom first.
    pub nodes: Vec<SceneNode>,
}

/// Build the scene for the current state.
///
/// Hidden and failed layers are skipped. With a timeline date set, plantings
/// outside their date range are left out.
#[must_use]
pub fn build_scene(tracked: &TrackedState, untracked: &UntrackedState, attached: &[ObjectId]) -> Scene {
    let shown = |kind: LayerKind| {
        untracked.is_layer_visible(kind) && !matches!(untracked.layer_status(kind), LayerStatus::Failed { .. })
    };

    let base_image = if shown(LayerKind::Base) {
        tracked.layer(LayerKind::Base).and_then(|l| l.settings.as_base()).and_then(|settings| {
            settings.image_path().map(|path| BaseImage {
                path: path.to_string(),
                scale: settings.image_scale(),
                rotation: settings.rotation,
            })
        })
    } else {
        None
    };

    let bounds = &untracked.editor_bounds;
    let (grid, yardstick) =
        if shown(LayerKind::Grid) { (grid::grid(bounds), grid::yardstick(bounds)) } else { (None, None) };

    let draggable_layer = untracked.active_tool.selects().then_some(untracked.selected_layer);
    let mut nodes = Vec::new();
    for layer in tracked.layers().filter(|l| !l.kind.is_frontend_only() && shown(l.kind)) {
        let on_selected = layer.kind == untracked.selected_layer;
        for obj in layer.objects() {
            if untracked.timeline_date.is_some_and(|d| !obj.is_visible_on(d)) {
                continue;
            }
            let attached = on_selected && attached.iter().any(|a| *a == obj.id);
            nodes.push(scene_node(obj, attached, draggable_layer == Some(layer.kind)));
        }
    }

    Scene { base_image, grid, yardstick, nodes }
}

fn scene_node(obj: &LayerObject, attached: bool, draggable: bool) -> SceneNode {
    SceneNode {
        id: obj.id.clone(),
        layer: obj.layer_kind,
        x: obj.x,
        y: obj.y,
        width: obj.width,
        height: obj.height,
        rotation: obj.rotation,
        scale_x: obj.scale_x,
        scale_y: obj.scale_y,
        attached,
        draggable,
    }
}
