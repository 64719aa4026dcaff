//! Shared numeric constants for the editing core.

// ── Units ───────────────────────────────────────────────────────

/// Canonical canvas density: one meter in the real world spans this many
/// world pixels, regardless of zoom.
pub const MAP_PIXELS_PER_METER: f64 = 100.0;

// ── Stage ───────────────────────────────────────────────────────

/// Zoom limits of the render stage.
pub const MIN_STAGE_SCALE: f64 = 0.01;
pub const MAX_STAGE_SCALE: f64 = 20.0;

// ── Grid ────────────────────────────────────────────────────────

/// Viewport width above which grid lines are placed every 1000 world pixels.
pub const GRID_COARSE_THRESHOLD: f64 = 5000.0;

/// Viewport width above which grid lines are placed every 100 world pixels.
pub const GRID_MEDIUM_THRESHOLD: f64 = 2000.0;

pub const GRID_STEP_COARSE: f64 = 1000.0;
pub const GRID_STEP_MEDIUM: f64 = 100.0;
pub const GRID_STEP_FINE: f64 = 10.0;

/// Grid stroke width is the viewport width divided by this.
pub const GRID_STROKE_DIVISOR: f64 = 3000.0;

/// Lines on multiples of this world coordinate are drawn at double stroke.
pub const GRID_MAJOR_INTERVAL: f64 = 100.0;

/// Upper bound on grid lines emitted per axis.
pub const GRID_MAX_LINES_PER_AXIS: usize = 2048;

// ── Yardstick ───────────────────────────────────────────────────

/// The yardstick sits the viewport width divided by this in from the top-left.
pub const YARDSTICK_INSET_DIVISOR: f64 = 15.0;

/// Yardstick stroke width is the viewport width divided by this.
pub const YARDSTICK_STROKE_DIVISOR: f64 = 1000.0;

/// Yardstick label font size as a multiple of its stroke width.
pub const YARDSTICK_FONT_FACTOR: f64 = 10.0;

// ── Sync ────────────────────────────────────────────────────────

/// Number of our own action ids remembered for broadcast echo detection.
pub const OWN_ACTION_MEMORY: usize = 1024;

// ── Geometry ────────────────────────────────────────────────────

/// Tolerance for deciding whether a coordinate sits on a lattice point.
pub const LATTICE_EPSILON: f64 = 1e-9;

/// Degrees in a full turn; rotations are normalized into `[0, 360)`.
pub const FULL_TURN_DEG: f64 = 360.0;
