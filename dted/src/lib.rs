//! # DTED - SRTM elevation grids and stores
//!
//! Library for loading SRTM (Shuttle Radar Topography Mission) `.hgt` tiles
//! into addressable elevation grids, merging tiles into larger maps, and
//! persisting sparse elevation samples in a database that answers bounding
//! box queries across the antimeridian.
//!
//! ## Coordinates
//!
//! All angles are fixed-point integers in units of `1 / resolution` degree,
//! where the resolution is the number of points per degree (1200 for SRTM-3).
//! Longitude wraps: [`coord::normalize`] folds any longitude into
//! `[-180°, 180°)`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use dted::{mosaic, store::ElevationStore, ElevationGrid};
//!
//! // Assemble a tile and its eight neighbours
//! let mosaic = mosaic::load_neighbourhood("/data/N35E138.hgt", 1200)?;
//!
//! // Persist the non-void samples
//! let conn = rusqlite::Connection::open("elevation.db")?;
//! let mut store = ElevationStore::open(&conn)?;
//! store.insert(&mosaic.grid)?;
//!
//! // Read back a window straddling 180°
//! let mut window = ElevationGrid::new(2400, 1200, 179 * 1200, 0, 1200);
//! store.query(&mut window)?;
//! ```
//!
//! ## SRTM Data Format
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Each sample is a 16-bit big-endian signed integer representing elevation in meters,
//! northernmost row first. The special value -32768 indicates void (no data).

pub mod coord;
pub mod error;
pub mod filename;
pub mod grid;
pub mod merge;
pub mod mosaic;
pub mod store;
pub mod tile;

// Re-export main types at crate root for convenience
pub use error::{DtedError, Result};
pub use grid::{ElevationGrid, GridStats, VOID_VALUE};
pub use merge::merge;
pub use mosaic::{Mosaic, Region};
pub use store::{ElevationStore, InsertSummary, Projection, StoreParameters};
pub use tile::{load_raw, load_srtm_tile, load_srtm_tile_from_directory, SrtmResolution};
