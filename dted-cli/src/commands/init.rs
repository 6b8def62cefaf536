use anyhow::{bail, Context, Result};
use dted::store::{ElevationStore, Projection, StoreParameters};
use std::path::PathBuf;
use tracing::info;

use super::{database_path, open_database};

pub fn run(
    database: Option<PathBuf>,
    description: String,
    resolution: u32,
    void_value: i16,
    force: bool,
) -> Result<()> {
    let path = database_path(database)?;
    let conn = open_database(&path)?;
    let mut store = ElevationStore::open(&conn).context("Failed to open elevation store")?;
    store.create_schema().context("Failed to create tables")?;

    let parameters = StoreParameters {
        description,
        projection: Projection::Dted,
        points_per_degree: i32::try_from(resolution).context("Resolution out of range")?,
        void_value,
    };

    // An empty parameter set fails to parse; anything that parses is a live store
    if let Ok(existing) = store.get_parameters() {
        if existing != parameters && !force {
            bail!(
                "Store {} already has parameters ({} points per degree, void {}). \
                 Use --force to replace them",
                path.display(),
                existing.points_per_degree,
                existing.void_value
            );
        }
    }

    store
        .set_parameters(&parameters)
        .context("Failed to write store parameters")?;
    info!(path = %path.display(), resolution, void_value, "Initialized store");

    println!("Initialized: {}", path.display());
    println!("  Description: {}", parameters.description);
    println!("  Projection: {}", parameters.projection);
    println!("  Points per degree: {}", parameters.points_per_degree);
    println!("  Void value: {}", parameters.void_value);

    Ok(())
}
