//! Assembling working grids from many SRTM tiles.
//!
//! Both entry points allocate one void-filled grid and [`merge`] every tile
//! that intersects it. Missing tiles are soft misses: the corresponding cells
//! stay void.
//!
//! [`merge`]: crate::merge::merge

use std::path::Path;

use tracing::{debug, info};

use crate::coord::{degrees_to_units, normalize, tile_span};
use crate::error::Result;
use crate::filename::derive_origin_from_srtm_name;
use crate::grid::ElevationGrid;
use crate::tile::{load_srtm_tile, load_srtm_tile_from_directory};

/// Offsets of the eight tiles around a centre tile, in whole degrees.
const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// A grid assembled from tiles, with bookkeeping about what was found.
#[derive(Debug, Clone)]
pub struct Mosaic {
    /// The merged grid.
    pub grid: ElevationGrid,
    /// Number of tiles merged into the grid.
    pub tiles_loaded: usize,
    /// Number of tiles that were absent or outside the valid range.
    pub tiles_missing: usize,
}

/// A rectangle in grid units, `[left, right) × [bottom, top)`.
///
/// `right` may exceed `180 * resolution` for regions that cross the
/// antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
}

impl Region {
    /// Create a region from its edges.
    pub fn new(left: i32, bottom: i32, right: i32, top: i32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Returns `true` if the region has no area.
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.top <= self.bottom
    }
}

/// Load the tile at `path` together with its eight neighbours.
///
/// The result is a `(3r + 1)²` grid whose centre third is the tile itself.
/// Neighbours are looked up in the tile's own directory by their canonical
/// SRTM names and are merged after the centre tile.
///
/// # Errors
///
/// Fails if the centre tile cannot be loaded or a neighbour is corrupt.
pub fn load_neighbourhood<P: AsRef<Path>>(path: P, resolution: u32) -> Result<Mosaic> {
    let path = path.as_ref();
    let (longitude, latitude) = derive_origin_from_srtm_name(path)?;
    let tile = load_srtm_tile(path, resolution)?;

    let r = resolution as i32;
    let mut grid = ElevationGrid::new(
        3 * resolution + 1,
        3 * resolution + 1,
        tile.left() - r,
        tile.bottom() - r,
        resolution,
    );
    grid.merge(&tile);

    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    let mut mosaic = Mosaic {
        grid,
        tiles_loaded: 1,
        tiles_missing: 0,
    };

    for (dx, dy) in NEIGHBOURS {
        let lon = normalize(longitude + dx, 1);
        let lat = latitude + dy;
        match load_srtm_tile_from_directory(directory, lon, lat, resolution)? {
            Some(neighbour) => {
                debug!(lon, lat, "Merging neighbour tile");
                mosaic.grid.merge(&neighbour);
                mosaic.tiles_loaded += 1;
            }
            None => mosaic.tiles_missing += 1,
        }
    }

    Ok(mosaic)
}

/// Load every tile in `directory` that intersects `region`.
///
/// The grid covers the whole-degree tiles spanning the region, plus the
/// shared eastern and northern edge, so its extent is a superset of
/// `region`. A region spanning the whole globe yields a grid exactly one
/// turn wide, whose eastern tile wraps onto its first column.
///
/// # Errors
///
/// Fails if any present tile is corrupt.
pub fn load_region<P: AsRef<Path>>(
    directory: P,
    region: Region,
    resolution: u32,
) -> Result<Mosaic> {
    let directory = directory.as_ref();
    let xs = tile_span(region.left, region.right, resolution);
    let ys = tile_span(region.bottom, region.top, resolution);
    // Each meridian appears once, even for regions wider than a full turn
    let xs = xs.start..xs.end.min(xs.start + 360);

    let tiles_wide = (xs.end - xs.start).max(0) as u32;
    let tiles_high = (ys.end - ys.start).max(0) as u32;
    let width = if tiles_wide >= 360 {
        360 * resolution
    } else {
        tiles_wide * resolution + 1
    };

    let mut mosaic = Mosaic {
        grid: ElevationGrid::new(
            width,
            tiles_high * resolution + 1,
            degrees_to_units(xs.start, resolution),
            degrees_to_units(ys.start, resolution),
            resolution,
        ),
        tiles_loaded: 0,
        tiles_missing: 0,
    };

    for x in xs.clone() {
        for y in ys.clone() {
            let lon = normalize(x, 1);
            match load_srtm_tile_from_directory(directory, lon, y, resolution)? {
                Some(tile) => {
                    debug!(lon, lat = y, "Merging region tile");
                    mosaic.grid.merge(&tile);
                    mosaic.tiles_loaded += 1;
                }
                None => mosaic.tiles_missing += 1,
            }
        }
    }

    info!(
        tiles_wide,
        tiles_high,
        loaded = mosaic.tiles_loaded,
        missing = mosaic.tiles_missing,
        "Assembled region"
    );

    Ok(mosaic)
}
