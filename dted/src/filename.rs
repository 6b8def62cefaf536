//! SRTM filename utilities.
//!
//! SRTM files follow the naming convention `{N|S}{lat}{E|W}{lon}.hgt`:
//!
//! - Latitude: 2 digits with N/S prefix (e.g., N35, S12)
//! - Longitude: 3 digits with E/W prefix (e.g., E138, W077)
//!
//! The name encodes the **southwest corner** of the 1° × 1° tile, in whole
//! degrees. All functions here return `(longitude, latitude)` in that order,
//! matching the `(x, y)` order of [`crate::ElevationGrid`].

use std::path::Path;

use crate::error::{DtedError, Result};

/// Build the canonical SRTM filename for the tile whose southwest corner is
/// at `(longitude, latitude)` whole degrees.
///
/// # Examples
///
/// ```
/// use dted::filename::srtm_filename;
///
/// assert_eq!(srtm_filename(138, 35), "N35E138.hgt");
/// assert_eq!(srtm_filename(-78, -13), "S13W078.hgt");
/// assert_eq!(srtm_filename(-1, 0), "N00W001.hgt");
/// ```
pub fn srtm_filename(longitude: i32, latitude: i32) -> String {
    let lat_prefix = if latitude >= 0 { 'N' } else { 'S' };
    let lon_prefix = if longitude >= 0 { 'E' } else { 'W' };

    format!(
        "{}{:02}{}{:03}.hgt",
        lat_prefix,
        latitude.abs(),
        lon_prefix,
        longitude.abs()
    )
}

/// Parse an SRTM filename into the `(longitude, latitude)` of its southwest
/// corner, in whole degrees.
///
/// Any directory prefix is ignored, as is everything from the first `.` on.
/// The remaining name must be at least 7 characters and start with
/// `[N|S]DD[E|W]DDD` (letters in either case).
///
/// # Errors
///
/// Returns [`DtedError::InvalidFilename`] if the name does not match.
///
/// # Examples
///
/// ```
/// use dted::filename::derive_origin_from_srtm_name;
///
/// assert_eq!(derive_origin_from_srtm_name("N35E138.hgt").unwrap(), (138, 35));
/// assert_eq!(derive_origin_from_srtm_name("/data/S12W077.hgt").unwrap(), (-77, -12));
/// assert!(derive_origin_from_srtm_name("invalid").is_err());
/// ```
pub fn derive_origin_from_srtm_name<P: AsRef<Path>>(filename: P) -> Result<(i32, i32)> {
    let path = filename.as_ref();
    let invalid = || DtedError::InvalidFilename {
        name: path.display().to_string(),
    };

    // Handle both separators regardless of platform
    let full = path.to_str().ok_or_else(invalid)?;
    let base = full.rsplit(['/', '\\']).next().unwrap_or(full);
    let stem = base.split('.').next().unwrap_or(base);

    if stem.len() < 7 || !stem.is_char_boundary(7) {
        return Err(invalid());
    }
    let bytes = stem.as_bytes();

    let lat_sign = match bytes[0] {
        b'N' | b'n' => 1,
        b'S' | b's' => -1,
        _ => return Err(invalid()),
    };
    let lon_sign = match bytes[3] {
        b'E' | b'e' => 1,
        b'W' | b'w' => -1,
        _ => return Err(invalid()),
    };

    let digits = |s: &str| -> Option<i32> {
        if s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    };
    let lat = digits(&stem[1..3]).ok_or_else(invalid)?;
    let lon = digits(&stem[4..7]).ok_or_else(invalid)?;

    Ok((lon * lon_sign, lat * lat_sign))
}

/// Returns `true` if `(longitude, latitude)` names an existing 1° tile.
///
/// Tiles are addressed by their southwest corner, so the valid ranges are
/// `-180..=179` for longitude and `-90..=89` for latitude.
pub fn is_valid_tile_coord(longitude: i32, latitude: i32) -> bool {
    (-180..=179).contains(&longitude) && (-90..=89).contains(&latitude)
}
