//! Measurement grid and yardstick geometry.
//!
//! Both are derived purely from the current editor bounds. Grid lines are
//! pinned to a lattice of the current step so they stay put while panning;
//! the step and stroke width adapt to the visible extent so the grid stays
//! legible at any zoom.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use serde::Serialize;
use tracing::debug;

use crate::camera::{Bounds, Point};
use crate::consts::{
    GRID_COARSE_THRESHOLD, GRID_MAJOR_INTERVAL, GRID_MAX_LINES_PER_AXIS, GRID_MEDIUM_THRESHOLD, GRID_STEP_COARSE,
    GRID_STEP_FINE, GRID_STEP_MEDIUM, GRID_STROKE_DIVISOR, LATTICE_EPSILON, MAP_PIXELS_PER_METER,
    YARDSTICK_FONT_FACTOR, YARDSTICK_INSET_DIVISOR, YARDSTICK_STROKE_DIVISOR,
};

/// Orientation of a grid line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Constant x, spanning the visible y range.
    Vertical,
    /// Constant y, spanning the visible x range.
    Horizontal,
}

/// A single grid line in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridLine {
    pub axis: Axis,
    /// The lattice coordinate the line sits on (x for vertical, y for horizontal).
    pub position: f64,
    pub from: Point,
    pub to: Point,
    pub stroke_width: f64,
    /// Whether the line sits on a multiple of [`GRID_MAJOR_INTERVAL`].
    pub major: bool,
}

/// All grid lines for one viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridGeometry {
    pub step: f64,
    pub stroke_width: f64,
    pub lines: Vec<GridLine>,
}

/// The fixed "1 meter" scale indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Yardstick {
    pub from: Point,
    pub to: Point,
    pub stroke_width: f64,
    pub font_size: f64,
    pub label: &'static str,
}

/// Grid spacing for a viewport of the given width.
#[must_use]
pub fn grid_step(width: f64) -> f64 {
    if width > GRID_COARSE_THRESHOLD {
        GRID_STEP_COARSE
    } else if width > GRID_MEDIUM_THRESHOLD {
        GRID_STEP_MEDIUM
    } else {
        GRID_STEP_FINE
    }
}

/// Base stroke width for a viewport of the given width.
#[must_use]
pub fn grid_stroke_width(width: f64) -> f64 {
    width / GRID_STROKE_DIVISOR
}

/// First lattice coordinate at or inside `-offset - extent`.
///
/// Uses a truncating remainder, so the result only depends on the lattice
/// and never on how far the viewport has been panned within one step.
#[must_use]
pub fn lattice_start(offset: f64, extent: f64, step: f64) -> f64 {
    let a = -offset - extent;
    a - a % step
}

/// Whether a world coordinate hosts a double-width line.
#[must_use]
pub fn is_major(position: f64) -> bool {
    (position % GRID_MAJOR_INTERVAL).abs() < LATTICE_EPSILON
}

/// Grid lines covering `bounds`, or `None` when there is nothing to draw.
#[must_use]
pub fn grid(bounds: &Bounds) -> Option<GridGeometry> {
    if !bounds.is_drawable() {
        return None;
    }
    let step = grid_step(bounds.width);
    let stroke_width = grid_stroke_width(bounds.width);

    let step_x = axis_step(step, bounds.width);
    let step_y = axis_step(step, bounds.height);
    let start_x = lattice_start(bounds.x, bounds.width, step_x);
    let start_y = lattice_start(bounds.y, bounds.height, step_y);
    let end_x = -bounds.x + bounds.width;
    let end_y = -bounds.y + bounds.height;

    let mut lines = Vec::new();
    for x in lattice(start_x, end_x, step_x) {
        lines.push(GridLine {
            axis: Axis::Vertical,
            position: x,
            from: Point::new(x, start_y),
            to: Point::new(x, end_y),
            stroke_width: line_width(x, stroke_width),
            major: is_major(x),
        });
    }
    for y in lattice(start_y, end_y, step_y) {
        lines.push(GridLine {
            axis: Axis::Horizontal,
            position: y,
            from: Point::new(start_x, y),
            to: Point::new(end_x, y),
            stroke_width: line_width(y, stroke_width),
            major: is_major(y),
        });
    }

    Some(GridGeometry { step, stroke_width, lines })
}

/// The "1m" yardstick for `bounds`, or `None` when there is nothing to draw.
#[must_use]
pub fn yardstick(bounds: &Bounds) -> Option<Yardstick> {
    if !bounds.is_drawable() {
        return None;
    }
    let inset = bounds.width / YARDSTICK_INSET_DIVISOR;
    let stroke_width = bounds.width / YARDSTICK_STROKE_DIVISOR;
    let from = Point::new(-bounds.x + inset, -bounds.y + inset);
    let to = Point::new(from.x + MAP_PIXELS_PER_METER, from.y);
    Some(Yardstick {
        from,
        to,
        stroke_width,
        font_size: stroke_width * YARDSTICK_FONT_FACTOR,
        label: "1m",
    })
}

/// Line spacing along one axis. The lattice spans `2 * extent`; when that
/// needs more than [`GRID_MAX_LINES_PER_AXIS`] lines at `step`, the spacing
/// grows by powers of ten so the whole axis stays covered.
#[allow(clippy::cast_precision_loss)]
fn axis_step(step: f64, extent: f64) -> f64 {
    let mut spacing = step;
    while 2.0 * extent / spacing > GRID_MAX_LINES_PER_AXIS as f64 {
        spacing *= 10.0;
    }
    if spacing > step {
        debug!(step, spacing, extent, "grid axis coarsened to fit the line cap");
    }
    spacing
}

fn line_width(position: f64, stroke_width: f64) -> f64 {
    if is_major(position) { stroke_width * 2.0 } else { stroke_width }
}

/// Lattice coordinates `start + i * step` strictly below `end`.
#[allow(clippy::cast_precision_loss)]
fn lattice(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    (0..GRID_MAX_LINES_PER_AXIS)
        .map(move |i| start + i as f64 * step)
        .take_while(move |v| *v < end)
}
