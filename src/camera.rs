#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_STAGE_SCALE, MIN_STAGE_SCALE};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The visible editor region in world pixels.
///
/// `x` / `y` are the stage offset: the visible region starts at world
/// coordinate `(-x, -y)`. `width` / `height` are the visible extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Whether the bounds describe a drawable area.
    ///
    /// A zero-sized viewport is a normal transient state while the host is
    /// still mounting; nothing is drawn for it.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Pan/zoom transform of the render stage.
///
/// A world point `p` is drawn at `p * scale + (x, y)` on screen, so `x` / `y`
/// are screen pixels and `scale` is the zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Stage {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

impl Stage {
    fn has_valid_scale(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0
    }

    /// The world point drawn at `screen`.
    #[must_use]
    pub fn to_world(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.scale, (screen.y - self.y) / self.scale)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.x += dx;
            self.y += dy;
        }
    }

    /// Multiply the scale by `factor`, keeping the world point under the
    /// screen point `anchor` in place. The scale stays within
    /// [`MIN_STAGE_SCALE`]..=[`MAX_STAGE_SCALE`]; non-positive factors are ignored.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !(factor.is_finite() && factor > 0.0 && self.has_valid_scale()) {
            return;
        }
        let world = self.to_world(anchor);
        self.scale = (self.scale * factor).clamp(MIN_STAGE_SCALE, MAX_STAGE_SCALE);
        self.x = anchor.x - world.x * self.scale;
        self.y = anchor.y - world.y * self.scale;
    }

    /// Editor bounds for a viewport of the given screen size.
    ///
    /// Empty while the scale is not a positive finite number.
    #[must_use]
    pub fn editor_bounds(&self, viewport_width: f64, viewport_height: f64) -> Bounds {
        if !self.has_valid_scale() {
            return Bounds::default();
        }
        Bounds::new(
            self.x / self.scale,
            self.y / self.scale,
            viewport_width / self.scale,
            viewport_height / self.scale,
        )
    }
}
