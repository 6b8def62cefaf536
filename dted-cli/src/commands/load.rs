use anyhow::{bail, Context, Result};
use dted::store::{ElevationStore, InsertSummary, SqliteBackend};
use dted::{load_srtm_tile, ElevationGrid};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{database_path, open_database};

pub fn run(
    database: Option<PathBuf>,
    files: Vec<PathBuf>,
    bulk: bool,
    tmp_file: Option<PathBuf>,
) -> Result<()> {
    let path = database_path(database)?;
    let conn = open_database(&path)?;
    let mut store = ElevationStore::open(&conn).context("Failed to open elevation store")?;
    let parameters = store
        .get_parameters()
        .context("Store has no parameters. Run `dted init` first")?;
    let resolution = parameters.resolution();

    let tmp_path = tmp_file.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("dted-{}.dat", std::process::id()))
    });

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let mut totals = InsertSummary::default();
    let mut failed = 0usize;

    for file in &files {
        pb.set_message(file.display().to_string());
        let tmp = bulk.then_some(tmp_path.as_path());
        match load_file(&mut store, file, resolution, tmp) {
            Ok(summary) => {
                totals.written += summary.written;
                totals.duplicates += summary.duplicates;
            }
            Err(e) => {
                warn!(path = %file.display(), error = %e, "Skipping file");
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    if bulk {
        if let Err(e) = std::fs::remove_file(&tmp_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp_path.display(), error = %e, "Failed to remove bulk file");
            }
        }
    }

    info!(
        files = files.len(),
        failed,
        written = totals.written,
        duplicates = totals.duplicates,
        "Load finished"
    );
    println!("Files loaded: {}", files.len() - failed);
    if failed > 0 {
        println!("Files skipped: {}", failed);
    }
    println!("Samples written: {}", totals.written);
    println!("Duplicates ignored: {}", totals.duplicates);

    if failed == files.len() {
        bail!("No files could be loaded");
    }
    Ok(())
}

/// Load one tile, crop off the edge it shares with its northern and eastern
/// neighbours, and write it to the store.
fn load_file(
    store: &mut ElevationStore<SqliteBackend<'_>>,
    file: &Path,
    resolution: u32,
    bulk_file: Option<&Path>,
) -> dted::Result<InsertSummary> {
    let tile = load_srtm_tile(file, resolution)?;
    let mut grid = ElevationGrid::new(
        resolution,
        resolution,
        tile.left(),
        tile.bottom(),
        resolution,
    );
    grid.merge(&tile);

    match bulk_file {
        Some(tmp) => store.load_via_bulk_file(&grid, tmp),
        None => store.insert(&grid),
    }
}
