pub mod export;
pub mod flat;
pub mod info;
pub mod init;
pub mod list;
pub mod load;
pub mod query;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Mean of the WGS84 equatorial and polar radii, in meters.
pub const EARTH_RADIUS_M: f64 = (6_378_136.49 + 6_356_751.7) / 2.0;

/// Meters spanned by one grid unit of latitude.
pub fn meters_per_unit(resolution: u32) -> f64 {
    EARTH_RADIUS_M * std::f64::consts::PI / 180.0 / f64::from(resolution)
}

pub fn database_path(database: Option<PathBuf>) -> Result<PathBuf> {
    database.context(
        "DTED_DATABASE environment variable not set. Use --database or set DTED_DATABASE",
    )
}

pub fn data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
    data_dir.context(
        "DTED_DATA_DIR environment variable not set. Use --data-dir or set DTED_DATA_DIR",
    )
}

pub fn open_database(path: &Path) -> Result<Connection> {
    Connection::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Human-readable extent of the tile whose south-west corner is given.
pub fn format_coverage(longitude: i32, latitude: i32) -> String {
    let lat_prefix = |lat: i32| if lat >= 0 { "N" } else { "S" };
    let lon_prefix = |lon: i32| if lon >= 0 { "E" } else { "W" };
    let east = dted::coord::normalize(longitude + 1, 1);
    format!(
        "{}{:02} to {}{:02}, {}{:03} to {}{:03}",
        lat_prefix(latitude),
        latitude.abs(),
        lat_prefix(latitude + 1),
        (latitude + 1).abs(),
        lon_prefix(longitude),
        longitude.abs(),
        lon_prefix(east),
        east.abs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(2_884_802), "2.75 MB");
    }

    #[test]
    fn test_format_coverage() {
        assert_eq!(format_coverage(138, 35), "N35 to N36, E138 to E139");
        assert_eq!(format_coverage(-1, -1), "S01 to N00, W001 to E000");
        assert_eq!(format_coverage(179, 0), "N00 to N01, E179 to W180");
    }

    #[test]
    fn test_meters_per_unit() {
        // about 92 m per 3 arc-seconds
        let m = meters_per_unit(1200);
        assert!((m - 92.6).abs() < 0.5, "{m}");
    }
}
