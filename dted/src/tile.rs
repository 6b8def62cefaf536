//! Decoding of raw SRTM `.hgt` rasters into [`ElevationGrid`]s.
//!
//! An SRTM file is a headerless block of `N × N` big-endian `i16` samples,
//! row-major, with the **northernmost** row first. Grids store the
//! southernmost row first, so rows are flipped while decoding.
//!
//! Adjacent tiles share their edge samples: an SRTM-3 tile covers one degree
//! at 1200 points per degree but holds 1201 × 1201 samples.

use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::coord::{degrees_to_units, SRTM1_RESOLUTION, SRTM3_RESOLUTION};
use crate::error::{DtedError, Result};
use crate::filename::{derive_origin_from_srtm_name, is_valid_tile_coord, srtm_filename};
use crate::grid::ElevationGrid;

/// File size for SRTM1 (1 arc-second, ~30m resolution): 3601 × 3601 × 2 bytes
const SRTM1_SIZE: u64 = 3601 * 3601 * 2; // 25,934,402 bytes

/// File size for SRTM3 (3 arc-second, ~90m resolution): 1201 × 1201 × 2 bytes
const SRTM3_SIZE: u64 = 1201 * 1201 * 2; // 2,884,802 bytes

/// Resolution type of an SRTM tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtmResolution {
    /// SRTM1: 1 arc-second (~30m) resolution
    Srtm1,
    /// SRTM3: 3 arc-second (~90m) resolution
    Srtm3,
}

impl SrtmResolution {
    /// Detect the resolution from a file size in bytes.
    pub fn from_file_size(size: u64) -> Option<Self> {
        match size {
            SRTM1_SIZE => Some(SrtmResolution::Srtm1),
            SRTM3_SIZE => Some(SrtmResolution::Srtm3),
            _ => None,
        }
    }

    /// Detect the resolution of a file on disk from its size.
    ///
    /// Returns `Ok(None)` when the size matches neither format.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)
            .map_err(|e| not_found_or_io(e, path))?
            .len();
        Ok(Self::from_file_size(size))
    }

    /// Points per degree.
    pub fn points_per_degree(&self) -> u32 {
        match self {
            SrtmResolution::Srtm1 => SRTM1_RESOLUTION,
            SrtmResolution::Srtm3 => SRTM3_RESOLUTION,
        }
    }

    /// Returns the number of samples per row/column for this resolution.
    pub fn samples(&self) -> u32 {
        self.points_per_degree() + 1
    }

    /// Returns the approximate resolution in meters.
    pub fn meters(&self) -> f64 {
        match self {
            SrtmResolution::Srtm1 => 30.0,
            SrtmResolution::Srtm3 => 90.0,
        }
    }
}

fn not_found_or_io(err: io::Error, path: &Path) -> DtedError {
    if err.kind() == io::ErrorKind::NotFound {
        DtedError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        DtedError::Io(err)
    }
}

/// Load a raw big-endian raster of `width × height` samples.
///
/// The file's first row becomes the grid's top row (`y = height - 1`).
/// Bytes past `width * height` samples are ignored.
///
/// # Errors
///
/// - [`DtedError::NotFound`] if the file does not exist
/// - [`DtedError::Truncated`] if the file holds fewer than `width * height` samples
/// - [`DtedError::Io`] for any other I/O failure
pub fn load_raw<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    left: i32,
    bottom: i32,
    resolution: u32,
) -> Result<ElevationGrid> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| not_found_or_io(e, path))?;

    let row_bytes = width as usize * 2;
    let expected = row_bytes as u64 * u64::from(height);
    let actual = file.metadata()?.len();
    if actual < expected {
        return Err(DtedError::Truncated {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }

    let mut samples = vec![0i16; width as usize * height as usize];
    if expected > 0 {
        // SAFETY: Memory mapping is safe as long as the file is not modified
        // while mapped. We open the file read-only and drop the mapping before
        // returning.
        let mmap = unsafe { Mmap::map(&file)? };
        let data = mmap.get(..expected as usize).ok_or(DtedError::Truncated {
            path: path.to_path_buf(),
            expected,
            actual: mmap.len() as u64,
        })?;

        for (row, bytes) in data.chunks_exact(row_bytes).enumerate() {
            let y = height as usize - row - 1;
            let dest = &mut samples[y * width as usize..(y + 1) * width as usize];
            for (sample, pair) in dest.iter_mut().zip(bytes.chunks_exact(2)) {
                *sample = i16::from_be_bytes([pair[0], pair[1]]);
            }
        }
    }

    debug!(
        path = %path.display(),
        width,
        height,
        left,
        bottom,
        "Loaded raw raster"
    );

    Ok(ElevationGrid::from_samples(
        width, height, left, bottom, resolution, samples,
    ))
}

/// Load an SRTM tile, taking its origin from the filename.
///
/// The grid is `(resolution + 1)²` samples with its southwest cell at the
/// tile's corner, so it includes the edge shared with the northern and
/// eastern neighbours.
///
/// # Errors
///
/// [`DtedError::InvalidFilename`] if the name does not encode an origin,
/// otherwise as [`load_raw`].
pub fn load_srtm_tile<P: AsRef<Path>>(path: P, resolution: u32) -> Result<ElevationGrid> {
    let path = path.as_ref();
    let (longitude, latitude) = derive_origin_from_srtm_name(path)?;
    let samples = resolution + 1;
    load_raw(
        path,
        samples,
        samples,
        degrees_to_units(longitude, resolution),
        degrees_to_units(latitude, resolution),
        resolution,
    )
}

/// Load the tile whose southwest corner is at `(longitude, latitude)` whole
/// degrees from `directory`.
///
/// Returns `Ok(None)` for coordinates outside `-180..=179` / `-90..=89` and
/// for tiles that are not present, so callers can probe neighbouring tiles
/// near the edge of their data.
///
/// # Errors
///
/// Truncated or unreadable files are still reported.
pub fn load_srtm_tile_from_directory<P: AsRef<Path>>(
    directory: P,
    longitude: i32,
    latitude: i32,
    resolution: u32,
) -> Result<Option<ElevationGrid>> {
    if !is_valid_tile_coord(longitude, latitude) {
        debug!(longitude, latitude, "Tile coordinate out of range");
        return Ok(None);
    }

    let path = directory.as_ref().join(srtm_filename(longitude, latitude));
    let samples = resolution + 1;
    match load_raw(
        &path,
        samples,
        samples,
        degrees_to_units(longitude, resolution),
        degrees_to_units(latitude, resolution),
        resolution,
    ) {
        Ok(grid) => Ok(Some(grid)),
        Err(DtedError::NotFound { path }) => {
            debug!(path = %path.display(), "Tile not present");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
