use anyhow::{bail, Context, Result};
use dted::coord::{ceil_div, floor_div, normalize, units_to_degrees};
use dted::mosaic::{load_region, Region};
use dted::ElevationGrid;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

use super::meters_per_unit;

/// Sampling layout of an exported raster around a centre point.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub resolution: u32,
    pub centre_x: i32,
    pub centre_y: i32,
    /// Grid units between output columns.
    pub x_step: i32,
    /// Grid units between output rows.
    pub y_step: i32,
    /// Area that must be loaded from tiles.
    pub bounds: Region,
    /// First and last output positions, aligned to the steps.
    pub readout: Region,
    /// Kilometers per grid unit east-west at the centre latitude.
    pub km_per_unit_x: f64,
    /// Kilometers per grid unit north-south.
    pub km_per_unit_y: f64,
}

impl ExportPlan {
    pub fn new(lon: f64, lat: f64, radius_m: f64, step_m: f64, resolution: u32) -> Self {
        let r = f64::from(resolution);
        let cos_lat = lat.to_radians().cos();
        let unit_m = meters_per_unit(resolution);
        let degree_m = unit_m * r;

        let v_extent = (radius_m / step_m + 1.0).ceil() * step_m / degree_m;
        // Near the poles the radius spans every meridian
        let h_extent =
            ((radius_m / cos_lat / step_m + 1.0).ceil() * step_m / degree_m).min(180.0);

        let bounds = Region::new(
            ((lon - h_extent) * r).floor() as i32,
            ((lat - v_extent) * r).floor() as i32,
            ((lon + h_extent) * r).ceil() as i32,
            ((lat + v_extent) * r).ceil() as i32,
        );

        let y_step = ((step_m / unit_m).floor() as i32).max(1);
        let full_turn = 360 * resolution as i32;
        let x_step = ((step_m / unit_m / cos_lat).floor() as i32).clamp(1, full_turn);

        let readout = Region::new(
            floor_div(bounds.left, x_step) * x_step,
            floor_div(bounds.bottom, y_step) * y_step,
            ceil_div(bounds.right, x_step) * x_step,
            ceil_div(bounds.top, y_step) * y_step,
        );

        Self {
            resolution,
            centre_x: (lon * r).floor() as i32,
            centre_y: (lat * r).floor() as i32,
            x_step,
            y_step,
            bounds,
            readout,
            km_per_unit_x: unit_m * cos_lat / 1000.0,
            km_per_unit_y: unit_m / 1000.0,
        }
    }

    /// Output columns and rows.
    pub fn dimensions(&self) -> (usize, usize) {
        (
            ((self.readout.right - self.readout.left) / self.x_step + 1) as usize,
            ((self.readout.top - self.readout.bottom) / self.y_step + 1) as usize,
        )
    }

    /// Every output row, column by column from the west, each column from
    /// the south: `(lon, lat, x_km, y_km, elevation)`.
    ///
    /// Positions with no valid samples in their box report the grid's void
    /// value.
    pub fn rows<'a>(
        &'a self,
        grid: &'a ElevationGrid,
    ) -> impl Iterator<Item = (f64, f64, f64, f64, f64)> + 'a {
        let r = self.resolution;
        let xs = (self.readout.left..=self.readout.right).step_by(self.x_step as usize);
        xs.flat_map(move |x| {
            let ys = (self.readout.bottom..=self.readout.top).step_by(self.y_step as usize);
            ys.map(move |y| {
                let elevation = box_average(grid, x, y, self.x_step, self.y_step)
                    .unwrap_or_else(|| f64::from(grid.void_value()));
                (
                    units_to_degrees(normalize(x, r), r),
                    units_to_degrees(y, r),
                    f64::from(normalize(x - self.centre_x, r)) * self.km_per_unit_x,
                    f64::from(y - self.centre_y) * self.km_per_unit_y,
                    elevation,
                )
            })
        })
    }
}

/// Weighted mean of the non-void samples in a `step`-sized box centred on
/// `(longitude, latitude)`.
///
/// With an even step the box spans `step + 1` samples and its edge samples
/// carry half weight, so neighbouring boxes share them equally. Samples the
/// grid does not cover are ignored.
pub fn box_average(
    grid: &ElevationGrid,
    longitude: i32,
    latitude: i32,
    x_step: i32,
    y_step: i32,
) -> Option<f64> {
    let (x_start, x_end) = (longitude - x_step / 2, longitude + x_step / 2);
    let (y_start, y_end) = (latitude - y_step / 2, latitude + y_step / 2);
    let edge_weight = |step: i32, i: i32, start: i32, end: i32| {
        if step % 2 == 0 && (i == start || i == end) {
            0.5
        } else {
            1.0
        }
    };

    let mut sum = 0.0;
    let mut norm = 0.0;
    for ix in x_start..=x_end {
        let x_weight = edge_weight(x_step, ix, x_start, x_end);
        let gx = grid.grid_x_of(ix);
        for iy in y_start..=y_end {
            let y_weight = edge_weight(y_step, iy, y_start, y_end);
            match grid.try_get(gx, grid.grid_y_of(iy)) {
                Some(el) if el != grid.void_value() => {
                    sum += f64::from(el) * x_weight * y_weight;
                    norm += x_weight * y_weight;
                }
                _ => {}
            }
        }
    }

    (norm > 0.0).then(|| sum / norm)
}

pub fn run(
    data_dir: Option<PathBuf>,
    resolution: u32,
    lon: f64,
    lat: f64,
    radius_km: f64,
    step_km: f64,
) -> Result<()> {
    if !(-90.0..90.0).contains(&lat) {
        bail!("Latitude must be in [-90, 90), got {}", lat);
    }
    if radius_km <= 0.0 || step_km <= 0.0 {
        bail!("Radius and step must be positive");
    }
    let dir = super::data_dir(data_dir)?;

    let plan = ExportPlan::new(lon, lat, radius_km * 1000.0, step_km * 1000.0, resolution);
    let (columns, rows) = plan.dimensions();
    info!(
        centre_x = plan.centre_x,
        centre_y = plan.centre_y,
        x_step = plan.x_step,
        y_step = plan.y_step,
        columns,
        rows,
        "Export layout"
    );

    let mosaic = load_region(&dir, plan.bounds, resolution)
        .with_context(|| format!("Failed to load tiles from {}", dir.display()))?;
    if mosaic.tiles_loaded == 0 {
        warn!(dir = %dir.display(), "No tiles found for the export area");
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(io::stdout().lock());
    for row in plan.rows(&mosaic.grid) {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dted::VOID_VALUE;

    #[test]
    fn test_box_average_odd_step() {
        let mut grid = ElevationGrid::new(10, 10, 0, 0, 1200);
        grid.fill(100);
        grid.set(5, 5, 400);
        // 3 × 3 box, equal weights
        assert_eq!(box_average(&grid, 5, 5, 3, 3), Some(1200.0 / 9.0));
    }

    #[test]
    fn test_box_average_even_step_halves_edges() {
        let mut grid = ElevationGrid::new(10, 10, 0, 0, 1200);
        grid.fill(0);
        // 3 × 3 samples for a step of 2; the centre weighs 1, corners 1/4
        grid.set(5, 5, 160);
        assert_eq!(box_average(&grid, 5, 5, 2, 2), Some(40.0));
    }

    #[test]
    fn test_box_average_skips_voids() {
        let mut grid = ElevationGrid::new(10, 10, 0, 0, 1200);
        grid.set(2, 2, 50);
        assert_eq!(box_average(&grid, 2, 2, 3, 3), Some(50.0));
        assert_eq!(box_average(&grid, 7, 7, 3, 3), None);
        // outside the grid entirely
        assert_eq!(box_average(&grid, 100, 100, 3, 3), None);
    }

    #[test]
    fn test_box_average_across_antimeridian() {
        let r = 1200;
        let mut grid = ElevationGrid::new(4, 4, 180 * r - 2, 0, r as u32);
        grid.fill(10);
        // -180° is column 2 of a grid starting just west of 180°
        assert_eq!(box_average(&grid, -180 * r, 1, 3, 3), Some(10.0));
    }

    #[test]
    fn test_plan_layout() {
        let plan = ExportPlan::new(-118.25, 34.05, 10_000.0, 90.0, 1200);
        assert_eq!(plan.centre_x, -141_900);
        assert_eq!(plan.y_step, 1);
        // one step spans more units of longitude than of latitude
        assert!(plan.x_step >= plan.y_step);
        assert_eq!(plan.readout.left % plan.x_step, 0);
        assert!(plan.readout.left <= plan.bounds.left);
        assert!(plan.readout.right >= plan.bounds.right);
        assert!(plan.readout.bottom <= plan.centre_y && plan.centre_y <= plan.readout.top);
        let (columns, rows) = plan.dimensions();
        assert!(columns > 100 && rows > 100);
    }

    #[test]
    fn test_plan_near_pole_stays_within_a_turn() {
        let resolution = 12;
        let full_turn = 360 * resolution as i32;
        let plan = ExportPlan::new(0.0, 89.9999, 10_000.0, 90.0, resolution);

        assert!(plan.bounds.right - plan.bounds.left <= full_turn + 2);
        assert!(plan.x_step <= full_turn);
        let (columns, rows) = plan.dimensions();
        assert!(columns <= 3, "{columns}");

        let mosaic = load_region("/nonexistent/dted", plan.bounds, resolution).unwrap();
        assert_eq!(mosaic.tiles_loaded, 0);
        assert_eq!(mosaic.grid.width(), 360 * resolution);
        assert_eq!(plan.rows(&mosaic.grid).count(), columns * rows);
    }

    #[test]
    fn test_rows_report_void_outside_data() {
        let grid = ElevationGrid::new(2, 2, 0, 0, 1200);
        let plan = ExportPlan::new(10.0, 10.0, 100.0, 90.0, 1200);
        assert!(plan
            .rows(&grid)
            .all(|(_, _, _, _, el)| el == f64::from(VOID_VALUE)));
    }
}
