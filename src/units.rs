//! Conversions between real-world meters and canvas pixels.
//!
//! The canvas has a fixed density of [`MAP_PIXELS_PER_METER`]; zoom is applied
//! on top of it by the render [`crate::camera::Stage`]. Base images are captured at
//! arbitrary resolutions and are scaled so one of their meters lands on one
//! canvas meter.

#[cfg(test)]
#[path = "units_test.rs"]
mod units_test;

use crate::consts::{FULL_TURN_DEG, MAP_PIXELS_PER_METER};

/// World pixels spanned by `meters`.
#[must_use]
pub fn meters_to_pixels(meters: f64) -> f64 {
    meters * MAP_PIXELS_PER_METER
}

/// Meters spanned by `pixels` world pixels.
#[must_use]
pub fn pixels_to_meters(pixels: f64) -> f64 {
    pixels / MAP_PIXELS_PER_METER
}

/// Scale factor that aligns an image of `pixels_per_meter` density with the canvas.
#[must_use]
pub fn base_layer_scale(pixels_per_meter: f64) -> f64 {
    pixels_per_meter / MAP_PIXELS_PER_METER
}

/// Normalize a rotation in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_rotation(degrees: f64) -> f64 {
    degrees.rem_euclid(FULL_TURN_DEG)
}
