use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// SRTM elevation store CLI tool
#[derive(Parser)]
#[command(name = "dted")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database holding the elevation store
    #[arg(long, env = "DTED_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Directory containing .hgt files
    #[arg(short, long, env = "DTED_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Points per degree of the tiles (1200 for SRTM3, 3600 for SRTM1)
    #[arg(
        short,
        long,
        env = "DTED_RESOLUTION",
        default_value = "1200",
        global = true
    )]
    resolution: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store tables and record its parameters
    Init {
        /// Free-text description of the store
        #[arg(long, default_value = "SRTM-3 DTED")]
        description: String,

        /// Elevation value meaning "no data"
        #[arg(long, default_value = "-32768", allow_hyphen_values = true)]
        void_value: i16,

        /// Overwrite parameters of an existing store
        #[arg(long)]
        force: bool,
    },

    /// Load SRTM tiles into the store
    Load {
        /// .hgt files to load
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Go through a tab-separated bulk file instead of row inserts
        #[arg(short, long)]
        bulk: bool,

        /// Location of the intermediate bulk file
        #[arg(long, requires = "bulk")]
        tmp_file: Option<PathBuf>,
    },

    /// Read a window from the store and summarise it
    Query {
        /// Western edge in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Southern edge in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Window width in degrees
        #[arg(long, default_value = "1.0")]
        width: f64,

        /// Window height in degrees
        #[arg(long, default_value = "1.0")]
        height: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Display information about an SRTM tile
    Info {
        /// Path to .hgt file, or tile name (e.g., N35E138)
        tile: Option<String>,

        /// Specify tile by latitude instead of filename
        #[arg(long, conflicts_with = "tile", requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Specify tile by longitude instead of filename
        #[arg(long, conflicts_with = "tile", requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List available SRTM tiles
    List,

    /// Find high, flat areas in tiles and their neighbourhood
    Flat {
        /// .hgt files to search
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Lowest acceptable elevation in meters
        #[arg(long, default_value = "2500")]
        min_elevation: i16,

        /// Largest acceptable elevation spread in meters
        #[arg(long, default_value = "100")]
        max_range: i32,

        /// Search radius in meters
        #[arg(long, default_value = "720")]
        radius: f64,

        /// Number of void samples at which a spot is rejected
        #[arg(long, default_value = "10")]
        max_void: usize,
    },

    /// Export a low-resolution raster around a point
    Export {
        /// Centre longitude in decimal degrees
        #[arg(long, default_value = "-118.25", allow_hyphen_values = true)]
        lon: f64,

        /// Centre latitude in decimal degrees
        #[arg(long, default_value = "34.05", allow_hyphen_values = true)]
        lat: f64,

        /// Radius of the exported area in kilometers
        #[arg(long, default_value = "10")]
        radius_km: f64,

        /// Approximate output spacing in kilometers
        #[arg(long, default_value = "0.09")]
        step_km: f64,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dted=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            description,
            void_value,
            force,
        } => commands::init::run(cli.database, description, cli.resolution, void_value, force),
        Commands::Load {
            files,
            bulk,
            tmp_file,
        } => commands::load::run(cli.database, files, bulk, tmp_file),
        Commands::Query {
            lon,
            lat,
            width,
            height,
            json,
        } => commands::query::run(cli.database, lon, lat, width, height, json),
        Commands::Info {
            tile,
            lat,
            lon,
            json,
        } => commands::info::run(cli.data_dir, cli.resolution, tile, lat, lon, json),
        Commands::List => commands::list::run(cli.data_dir, cli.resolution),
        Commands::Flat {
            files,
            min_elevation,
            max_range,
            radius,
            max_void,
        } => commands::flat::run(
            files,
            cli.resolution,
            commands::flat::Criteria {
                min_elevation,
                max_range,
                radius,
                max_void,
            },
        ),
        Commands::Export {
            lon,
            lat,
            radius_km,
            step_km,
        } => commands::export::run(cli.data_dir, cli.resolution, lon, lat, radius_km, step_km),
    }
}
