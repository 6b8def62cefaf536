use anyhow::{bail, Context, Result};
use dted::filename::derive_origin_from_srtm_name;
use dted::SrtmResolution;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{format_coverage, format_size};

/// One `.hgt` file found in the data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TileEntry {
    pub name: String,
    /// South-west corner in whole degrees, if the name encodes one.
    pub origin: Option<(i32, i32)>,
    pub size: u64,
    pub format: Option<SrtmResolution>,
}

impl TileEntry {
    /// Whether this tile can be loaded at `resolution` points per degree.
    pub fn matches(&self, resolution: u32) -> bool {
        self.format
            .map_or(false, |f| f.points_per_degree() == resolution)
    }
}

/// Every `.hgt` file in `dir`, sorted by name.
pub fn scan_directory(dir: &Path) -> Result<Vec<TileEntry>> {
    let mut tiles = Vec::new();
    for entry in fs::read_dir(dir).context("Failed to read data directory")? {
        let entry = entry?;
        let path = entry.path();
        let is_hgt = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("hgt"));
        if !is_hgt {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        tiles.push(TileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            origin: derive_origin_from_srtm_name(&path).ok(),
            size,
            format: SrtmResolution::from_file_size(size),
        });
    }
    tiles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tiles)
}

pub fn run(data_dir: Option<PathBuf>, resolution: u32) -> Result<()> {
    let dir = super::data_dir(data_dir)?;
    if !dir.exists() {
        bail!("Data directory does not exist: {}", dir.display());
    }

    let tiles = scan_directory(&dir)?;
    if tiles.is_empty() {
        println!("No .hgt files found in: {}", dir.display());
        return Ok(());
    }

    println!("{:<12} {:>8} {:>26}", "TILE", "TYPE", "COVERAGE");
    println!("{}", "-".repeat(48));

    for tile in &tiles {
        let kind = match tile.format {
            Some(SrtmResolution::Srtm1) => "SRTM1",
            Some(SrtmResolution::Srtm3) => "SRTM3",
            None => "???",
        };
        let coverage = tile
            .origin
            .map_or_else(|| "Unknown".to_string(), |(lon, lat)| format_coverage(lon, lat));
        let marker = if tile.matches(resolution) { "" } else { "  *" };
        println!("{:<12} {:>8} {:>26}{}", tile.name, kind, coverage, marker);
    }

    let total_size: u64 = tiles.iter().map(|t| t.size).sum();
    let count = |format| tiles.iter().filter(|t| t.format == Some(format)).count();
    let mismatched = tiles.iter().filter(|t| !t.matches(resolution)).count();

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    for (label, format) in [
        ("SRTM1 (30m)", SrtmResolution::Srtm1),
        ("SRTM3 (90m)", SrtmResolution::Srtm3),
    ] {
        let n = count(format);
        if n > 0 {
            println!("  {}: {}", label, n);
        }
    }
    if mismatched > 0 {
        warn!(mismatched, resolution, "Tiles do not match the active resolution");
        println!(
            "  Not loadable at {} points per degree (*): {}",
            resolution, mismatched
        );
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Data directory: {}", dir.display());

    Ok(())
}
