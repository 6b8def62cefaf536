//! Fixed-point geodetic coordinates.
//!
//! Angles are integers in units of `1 / resolution` degree ("grid units"), so
//! a resolution of 1200 means one unit is 3 arc-seconds. Integer arithmetic
//! keeps the longitude wrap at ±180° exact.
//!
//! Longitude is circular: `180°E` and `180°W` are the same meridian, and
//! [`normalize`] folds every longitude into `[-180°, 180°)`. Latitude has no
//! wraparound and is never normalized.

use std::ops::Range;

/// Points per degree of SRTM-3 (3 arc-second) tiles.
pub const SRTM3_RESOLUTION: u32 = 1200;

/// Points per degree of SRTM-1 (1 arc-second) tiles.
pub const SRTM1_RESOLUTION: u32 = 3600;

/// Largest resolution for which a full turn still fits in an `i32`.
pub const MAX_RESOLUTION: u32 = i32::MAX as u32 / 360;

/// Fold a longitude in grid units into `[-180 * resolution, 180 * resolution)`.
///
/// # Panics
///
/// Panics if `resolution` is zero or larger than [`MAX_RESOLUTION`].
///
/// # Examples
///
/// ```
/// use dted::coord::normalize;
///
/// assert_eq!(normalize(181, 1), -179);
/// assert_eq!(normalize(180, 1), -180);
/// assert_eq!(normalize(-181, 1), 179);
/// assert_eq!(normalize(720 + 5, 1), 5);
/// ```
pub fn normalize(x: i32, resolution: u32) -> i32 {
    assert!(
        resolution > 0 && resolution <= MAX_RESOLUTION,
        "resolution must be in 1..={MAX_RESOLUTION}, got {resolution}"
    );
    let wrap = 360 * i64::from(resolution);
    let mut folded = i64::from(x).rem_euclid(wrap);
    if folded >= wrap / 2 {
        folded -= wrap;
    }
    // |folded| <= 180 * MAX_RESOLUTION, which fits in i32
    folded as i32
}

/// Convert whole degrees to grid units.
pub fn degrees_to_units(degrees: i32, resolution: u32) -> i32 {
    degrees * resolution as i32
}

/// Convert a fractional degree value to grid units, rounding towards -∞.
pub fn degrees_to_units_floor(degrees: f64, resolution: u32) -> i32 {
    (degrees * f64::from(resolution)).floor() as i32
}

/// Convert a fractional degree value to grid units, rounding towards +∞.
pub fn degrees_to_units_ceil(degrees: f64, resolution: u32) -> i32 {
    (degrees * f64::from(resolution)).ceil() as i32
}

/// Convert grid units back to decimal degrees.
pub fn units_to_degrees(units: i32, resolution: u32) -> f64 {
    f64::from(units) / f64::from(resolution)
}

/// Integer division rounding towards -∞ (`divisor` must be positive).
pub fn floor_div(value: i32, divisor: i32) -> i32 {
    value.div_euclid(divisor)
}

/// Integer division rounding towards +∞ (`divisor` must be positive).
pub fn ceil_div(value: i32, divisor: i32) -> i32 {
    -(-value).div_euclid(divisor)
}

/// Whole-degree tile indices whose 1° cells intersect `[start, end)` grid units.
///
/// The returned range is not normalized: near the antimeridian it may run
/// past 179, and callers fold each index with `normalize(index, 1)`.
pub fn tile_span(start: i32, end: i32, resolution: u32) -> Range<i32> {
    let r = resolution as i32;
    floor_div(start, r)..ceil_div(end, r)
}
