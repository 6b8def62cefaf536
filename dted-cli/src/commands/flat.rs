use anyhow::{bail, Result};
use dted::coord::units_to_degrees;
use dted::mosaic::load_neighbourhood;
use dted::ElevationGrid;
use std::path::PathBuf;
use tracing::{info, warn};

use super::meters_per_unit;

/// Thresholds a neighbourhood must meet to count as flat.
#[derive(Debug, Clone, Copy)]
pub struct Criteria {
    /// Lowest sample in the disk must be at least this high.
    pub min_elevation: i16,
    /// Highest minus lowest sample must not exceed this.
    pub max_range: i32,
    /// Disk radius in meters.
    pub radius: f64,
    /// Reject the spot once this many samples in the disk are void.
    pub max_void: usize,
}

/// A cell whose surrounding disk satisfies the [`Criteria`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatSpot {
    pub longitude: i32,
    pub latitude: i32,
    pub min: i16,
    pub max: i16,
    /// Cells in the disk.
    pub disk: usize,
    /// Non-void cells in the disk.
    pub valid: usize,
    pub mean: f64,
}

pub fn run(files: Vec<PathBuf>, resolution: u32, criteria: Criteria) -> Result<()> {
    if criteria.radius <= 0.0 {
        bail!("Search radius must be positive, got {}", criteria.radius);
    }

    let mut found = 0usize;
    let mut failed = 0usize;

    for file in &files {
        let mosaic = match load_neighbourhood(file, resolution) {
            Ok(mosaic) => mosaic,
            Err(e) => {
                warn!(path = %file.display(), error = %e, "Skipping file");
                failed += 1;
                continue;
            }
        };
        info!(
            path = %file.display(),
            tiles_loaded = mosaic.tiles_loaded,
            tiles_missing = mosaic.tiles_missing,
            "Loaded neighbourhood"
        );

        let spots = find_flat_spots(&mosaic.grid, &criteria);
        for spot in &spots {
            println!(
                "{:.6} {:.6} {} {} {} {} {:.2}",
                units_to_degrees(spot.longitude, resolution),
                units_to_degrees(spot.latitude, resolution),
                spot.min,
                spot.max,
                spot.disk,
                spot.valid,
                spot.mean
            );
        }
        found += spots.len();
    }

    info!(files = files.len(), failed, found, "Search finished");
    Ok(())
}

/// Cell offsets within `radius` meters of the origin at `latitude_deg`.
pub fn disk_offsets(radius: f64, latitude_deg: f64, resolution: u32) -> Vec<(i32, i32)> {
    let scale_y = meters_per_unit(resolution);
    let scale_x = scale_y * latitude_deg.to_radians().cos();

    let ny = (radius / scale_y).ceil() as i32 + 1;
    // Near the poles a disk would span more than the whole neighbourhood
    let nx = ((radius / scale_x).ceil() as i32 + 1).min(resolution as i32);

    let mut offsets = Vec::new();
    for iy in -ny..=ny {
        let delta_y = f64::from(iy) * scale_y;
        for ix in -nx..=nx {
            let delta_x = f64::from(ix) * scale_x;
            if delta_x.hypot(delta_y) <= radius {
                offsets.push((ix, iy));
            }
        }
    }
    offsets
}

/// Scan the centre tile of a `(3r + 1)²` neighbourhood grid for flat spots.
pub fn find_flat_spots(grid: &ElevationGrid, criteria: &Criteria) -> Vec<FlatSpot> {
    let resolution = grid.resolution();
    let r = resolution as i32;
    let tile_bottom = grid.latitude_of(r);
    let mean_latitude = units_to_degrees(tile_bottom, resolution) + 0.5;
    let offsets = disk_offsets(criteria.radius, mean_latitude, resolution);
    let void_value = grid.void_value();

    let mut spots = Vec::new();
    for y in r..=2 * r {
        for x in r..=2 * r {
            let mut min = i16::MAX;
            let mut max = i16::MIN;
            let mut sum = 0i64;
            let mut valid = 0usize;

            for &(dx, dy) in &offsets {
                match grid.try_get(x + dx, y + dy) {
                    Some(el) if el != void_value => {
                        min = min.min(el);
                        max = max.max(el);
                        sum += i64::from(el);
                        valid += 1;
                    }
                    _ => {}
                }
            }

            if valid == 0 {
                continue;
            }
            if min >= criteria.min_elevation
                && i32::from(max) - i32::from(min) <= criteria.max_range
                && offsets.len() - valid < criteria.max_void
            {
                spots.push(FlatSpot {
                    longitude: grid.longitude_of(x),
                    latitude: grid.latitude_of(y),
                    min,
                    max,
                    disk: offsets.len(),
                    valid,
                    mean: sum as f64 / valid as f64,
                });
            }
        }
    }
    spots
}
