use anyhow::{bail, Context, Result};
use dted::coord::{degrees_to_units_ceil, degrees_to_units_floor, units_to_degrees};
use dted::store::ElevationStore;
use dted::ElevationGrid;
use serde::Serialize;
use std::path::PathBuf;

use super::{database_path, open_database};

#[derive(Serialize)]
struct QueryResponse {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    width: u32,
    height: u32,
    samples: usize,
    void: u64,
    min: Option<i16>,
    max: Option<i16>,
}

pub fn run(
    database: Option<PathBuf>,
    lon: f64,
    lat: f64,
    width: f64,
    height: f64,
    json: bool,
) -> Result<()> {
    if !(width > 0.0 && width <= 360.0) {
        bail!("Width must be in (0, 360] degrees, got {}", width);
    }
    if !(height > 0.0 && lat >= -90.0 && lat + height <= 90.0) {
        bail!("Window {}..{} is outside -90..90 degrees latitude", lat, lat + height);
    }

    let path = database_path(database)?;
    let conn = open_database(&path)?;
    let mut store = ElevationStore::open(&conn).context("Failed to open elevation store")?;
    let resolution = store
        .get_parameters()
        .context("Store has no parameters. Run `dted init` first")?
        .resolution();

    let left = degrees_to_units_floor(lon, resolution);
    let bottom = degrees_to_units_floor(lat, resolution);
    let right = degrees_to_units_ceil(lon + width, resolution);
    let top = degrees_to_units_ceil(lat + height, resolution);
    let grid_width = ((right - left) as u32).min(360 * resolution);
    let grid_height = (top - bottom) as u32;

    let mut grid = ElevationGrid::new(grid_width, grid_height, left, bottom, resolution);
    let samples = store.query(&mut grid).context("Query failed")?;
    let stats = grid.stats();

    let response = QueryResponse {
        west: units_to_degrees(grid.left(), resolution),
        south: units_to_degrees(grid.bottom(), resolution),
        east: units_to_degrees(grid.right(), resolution),
        north: units_to_degrees(grid.top(), resolution),
        width: grid.width(),
        height: grid.height(),
        samples,
        void: stats.void_count,
        min: stats.min,
        max: stats.max,
    };

    if json {
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    println!(
        "Window: {:.4}..{:.4} E, {:.4}..{:.4} N ({}x{} cells)",
        response.west,
        response.east,
        response.south,
        response.north,
        response.width,
        response.height
    );
    println!("Stored samples: {}", response.samples);
    match (stats.min, stats.max) {
        (Some(min), Some(max)) => {
            println!("Min elevation: {}m", min);
            println!("Max elevation: {}m", max);
        }
        _ => println!("No data in window"),
    }
    if stats.void_count > 0 {
        println!(
            "Void cells: {} ({:.1}%)",
            stats.void_count,
            stats.void_fraction() * 100.0
        );
    }

    Ok(())
}
