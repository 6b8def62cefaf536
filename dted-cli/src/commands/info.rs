use anyhow::{bail, Context, Result};
use dted::filename::{derive_origin_from_srtm_name, srtm_filename};
use dted::{load_srtm_tile, SrtmResolution};
use serde::Serialize;
use std::path::PathBuf;

use super::{format_coverage, format_size};

#[derive(Serialize)]
struct TileInfo {
    tile: String,
    path: String,
    resolution: u32,
    samples: u32,
    lon: i32,
    lat: i32,
    file_size: u64,
    min: Option<i16>,
    max: Option<i16>,
    void: u64,
}

pub fn run(
    data_dir: Option<PathBuf>,
    resolution: u32,
    tile: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    json: bool,
) -> Result<()> {
    // Determine tile filename
    let tile_path = match (tile, lat, lon) {
        (_, Some(lat), Some(lon)) => {
            let filename = srtm_filename(lon.floor() as i32, lat.floor() as i32);
            super::data_dir(data_dir)?.join(filename)
        }
        (Some(tile), _, _) if tile.to_lowercase().ends_with(".hgt") => PathBuf::from(tile),
        // Just tile name (e.g., "N35E138")
        (Some(tile), _, _) => super::data_dir(data_dir)?.join(format!("{}.hgt", tile)),
        _ => bail!("Specify a tile name, a path, or --lat and --lon"),
    };

    if !tile_path.exists() {
        bail!("Tile not found: {}", tile_path.display());
    }

    let (base_lon, base_lat) = derive_origin_from_srtm_name(&tile_path)
        .with_context(|| format!("Not an SRTM tile name: {}", tile_path.display()))?;

    // Fall back to the requested resolution for non-standard sizes
    let resolution = SrtmResolution::detect(&tile_path)?
        .map(|r| r.points_per_degree())
        .unwrap_or(resolution);

    let grid = load_srtm_tile(&tile_path, resolution).context("Failed to load tile")?;
    let stats = grid.stats();
    let file_size = std::fs::metadata(&tile_path)?.len();

    let info = TileInfo {
        tile: srtm_filename(base_lon, base_lat),
        path: tile_path.display().to_string(),
        resolution,
        samples: grid.width(),
        lon: base_lon,
        lat: base_lat,
        file_size,
        min: stats.min,
        max: stats.max,
        void: stats.void_count,
    };

    if json {
        println!("{}", serde_json::to_string(&info)?);
        return Ok(());
    }

    let resolution_str = match SrtmResolution::from_file_size(file_size) {
        Some(SrtmResolution::Srtm1) => "SRTM1 (~30m)",
        Some(SrtmResolution::Srtm3) => "SRTM3 (~90m)",
        None => "custom",
    };

    println!("Tile: {}", info.tile);
    println!("Path: {}", info.path);
    println!();
    println!(
        "Resolution: {} ({} points per degree, {}x{} samples)",
        resolution_str, resolution, info.samples, info.samples
    );
    println!("Coverage: {}", format_coverage(base_lon, base_lat));
    println!("File size: {}", format_size(file_size));
    println!();

    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("Min elevation: {}m", min);
        println!("Max elevation: {}m", max);
    }

    if stats.void_count > 0 {
        println!(
            "Void samples: {} ({:.1}%)",
            stats.void_count,
            stats.void_fraction() * 100.0
        );
    }

    Ok(())
}
