//! In-memory elevation rasters.
//!
//! An [`ElevationGrid`] is a dense, row-major block of `i16` samples anchored
//! at the geodetic coordinate of its south-west cell. Cell `(x, y)` sits at
//! longitude `left + x` and latitude `bottom + y`, both in grid units (see
//! [`crate::coord`]). Row 0 is the southernmost row.

use crate::coord::normalize;

/// Value indicating no data (void) in SRTM files.
pub const VOID_VALUE: i16 = -32768;

/// A rectangular raster of elevation samples.
///
/// The grid owns its sample buffer. Reading or writing a cell outside
/// `0..width` × `0..height` panics.
///
/// # Example
///
/// ```
/// use dted::{ElevationGrid, VOID_VALUE};
///
/// // One degree square at N35E138, SRTM-3 resolution
/// let mut grid = ElevationGrid::new(1200, 1200, 138 * 1200, 35 * 1200, 1200);
/// assert_eq!(grid.get(0, 0), VOID_VALUE);
///
/// grid.set(600, 600, 3776);
/// assert_eq!(grid.get(600, 600), 3776);
/// assert_eq!(grid.right(), 139 * 1200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationGrid {
    width: u32,
    height: u32,
    /// Longitude of column 0, in grid units
    left: i32,
    /// Latitude of row 0, in grid units
    bottom: i32,
    /// Points per degree
    resolution: u32,
    void_value: i16,
    samples: Box<[i16]>,
}

impl ElevationGrid {
    /// Create a void-filled grid using [`VOID_VALUE`] as the sentinel.
    pub fn new(width: u32, height: u32, left: i32, bottom: i32, resolution: u32) -> Self {
        Self::with_void_value(width, height, left, bottom, resolution, VOID_VALUE)
    }

    /// Create a grid filled with a custom void sentinel.
    pub fn with_void_value(
        width: u32,
        height: u32,
        left: i32,
        bottom: i32,
        resolution: u32,
        void_value: i16,
    ) -> Self {
        assert!(resolution > 0, "grid resolution must be positive");
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            left: normalize(left, resolution),
            bottom,
            resolution,
            void_value,
            samples: vec![void_value; len].into_boxed_slice(),
        }
    }

    /// Create a grid that takes ownership of an existing row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len() != width * height`.
    pub fn from_samples(
        width: u32,
        height: u32,
        left: i32,
        bottom: i32,
        resolution: u32,
        samples: Vec<i16>,
    ) -> Self {
        assert!(resolution > 0, "grid resolution must be positive");
        assert_eq!(
            samples.len(),
            width as usize * height as usize,
            "sample buffer does not match a {width}x{height} grid"
        );
        Self {
            width,
            height,
            left: normalize(left, resolution),
            bottom,
            resolution,
            void_value: VOID_VALUE,
            samples: samples.into_boxed_slice(),
        }
    }

    /// Width in grid units (number of columns).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in grid units (number of rows).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Longitude of the westmost column, normalized into `[-180°, 180°)`.
    pub fn left(&self) -> i32 {
        self.left
    }

    /// Longitude one past the eastmost column.
    ///
    /// Not normalized: a grid that crosses the antimeridian has
    /// `right() > 180 * resolution`.
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    /// Latitude of the southmost row.
    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Latitude one past the northmost row.
    pub fn top(&self) -> i32 {
        self.bottom + self.height as i32
    }

    /// Points per degree.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// The sentinel meaning "no data".
    pub fn void_value(&self) -> i16 {
        self.void_value
    }

    /// Row-major view of all samples, row 0 first.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns `true` if `(x, y)` addresses a cell of this grid.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    /// Read the sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the grid.
    pub fn get(&self, x: u32, y: u32) -> i16 {
        self.samples[self.index(x, y)]
    }

    /// Read the sample at a signed offset, or `None` outside the grid.
    pub fn try_get(&self, x: i32, y: i32) -> Option<i16> {
        if self.contains(x, y) {
            Some(self.get(x as u32, y as u32))
        } else {
            None
        }
    }

    /// Write the sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the grid.
    pub fn set(&mut self, x: u32, y: u32, value: i16) {
        let index = self.index(x, y);
        self.samples[index] = value;
    }

    /// Returns `true` if the cell at `(x, y)` holds the void sentinel.
    pub fn is_void(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == self.void_value
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: i16) {
        self.samples.fill(value);
    }

    /// Change the sentinel and reset every cell to it.
    pub fn reset_void(&mut self, void_value: i16) {
        self.void_value = void_value;
        self.fill(void_value);
    }

    /// Iterate over `(x, y, value)` for every cell, row by row from the south.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, i16)> + '_ {
        let width = self.width as usize;
        self.samples
            .iter()
            .enumerate()
            .map(move |(i, &v)| ((i % width) as u32, (i / width) as u32, v))
    }

    /// Column offset of `longitude` within this grid.
    ///
    /// The difference is folded around the grid's horizontal centre, so a
    /// grid straddling the antimeridian addresses both `179.9°` and
    /// `-179.9°` with in-range offsets. The result may still lie outside
    /// `0..width` for longitudes the grid does not cover.
    pub fn grid_x_of(&self, longitude: i32) -> i32 {
        let half = (self.width / 2) as i32;
        normalize(longitude - self.left - half, self.resolution) + half
    }

    /// Row offset of `latitude` within this grid.
    pub fn grid_y_of(&self, latitude: i32) -> i32 {
        latitude - self.bottom
    }

    /// Normalized longitude of column `x`.
    pub fn longitude_of(&self, x: i32) -> i32 {
        normalize(x + self.left, self.resolution)
    }

    /// Latitude of row `y`.
    pub fn latitude_of(&self, y: i32) -> i32 {
        y + self.bottom
    }

    /// Summary statistics over the non-void cells.
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            total: self.samples.len() as u64,
            ..GridStats::default()
        };
        for &v in self.samples.iter().filter(|&&v| v != self.void_value) {
            stats.min = Some(stats.min.map_or(v, |m: i16| m.min(v)));
            stats.max = Some(stats.max.map_or(v, |m: i16| m.max(v)));
        }
        stats.void_count = self
            .samples
            .iter()
            .filter(|&&v| v == self.void_value)
            .count() as u64;
        stats
    }
}

/// Elevation statistics of a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Lowest non-void sample, `None` if every cell is void.
    pub min: Option<i16>,
    /// Highest non-void sample.
    pub max: Option<i16>,
    /// Number of void cells.
    pub void_count: u64,
    /// Total number of cells.
    pub total: u64,
}

impl GridStats {
    /// Fraction of void cells (0.0 to 1.0).
    pub fn void_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.void_count as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: u32 = 1200;

    #[test]
    fn test_new_grid_is_void() {
        let grid = ElevationGrid::new(4, 3, 0, 0, R);
        assert_eq!(grid.len(), 12);
        assert!(grid.cells().all(|(_, _, v)| v == VOID_VALUE));
        assert_eq!(grid.stats().void_count, 12);
        assert_eq!(grid.stats().min, None);
    }

    #[test]
    fn test_extents() {
        let grid = ElevationGrid::new(1201, 1201, 138 * 1200, 35 * 1200, R);
        assert_eq!(grid.left(), 165600);
        assert_eq!(grid.right(), 165600 + 1201);
        assert_eq!(grid.bottom(), 42000);
        assert_eq!(grid.top(), 42000 + 1201);
    }

    #[test]
    fn test_left_is_normalized() {
        let grid = ElevationGrid::new(10, 10, 181 * 1200, 0, R);
        assert_eq!(grid.left(), -179 * 1200);
    }

    #[test]
    fn test_from_samples_row_major() {
        let grid = ElevationGrid::from_samples(3, 2, 0, 0, R, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(grid.get(0, 0), 1);
        assert_eq!(grid.get(2, 0), 3);
        assert_eq!(grid.get(0, 1), 4);
        assert_eq!(grid.get(2, 1), 6);
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells[4], (1, 1, 5));
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_from_samples_wrong_length() {
        ElevationGrid::from_samples(3, 3, 0, 0, R, vec![0; 8]);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_get_out_of_range_panics() {
        let grid = ElevationGrid::new(4, 4, 0, 0, R);
        grid.get(4, 0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_set_out_of_range_panics() {
        let mut grid = ElevationGrid::new(4, 4, 0, 0, R);
        grid.set(0, 4, 1);
    }

    #[test]
    fn test_try_get() {
        let mut grid = ElevationGrid::new(4, 4, 0, 0, R);
        grid.set(3, 3, 7);
        assert_eq!(grid.try_get(3, 3), Some(7));
        assert_eq!(grid.try_get(-1, 0), None);
        assert_eq!(grid.try_get(0, 4), None);
    }

    #[test]
    fn test_coordinate_round_trip() {
        let grids = [
            ElevationGrid::new(1201, 1201, 138 * 1200, 35 * 1200, R),
            ElevationGrid::new(2400, 10, 179 * 1200, -10, R),
            ElevationGrid::new(3601, 3601, -181 * 1200, -1200, R),
            ElevationGrid::new(7, 5, -180 * 1200, 0, R),
        ];
        for grid in &grids {
            for x in [0, 1, grid.width() as i32 / 2, grid.width() as i32 - 1] {
                assert_eq!(grid.grid_x_of(grid.longitude_of(x)), x);
            }
            for y in [0, 1, grid.height() as i32 - 1] {
                assert_eq!(grid.grid_y_of(grid.latitude_of(y)), y);
            }
        }
    }

    #[test]
    fn test_grid_x_of_across_dateline() {
        // Spans 179°E..181°E
        let grid = ElevationGrid::new(2400, 1, 179 * 1200, 0, R);
        assert_eq!(grid.grid_x_of(179 * 1200 + 600), 600);
        // 179.5°W lies 1.5° east of the grid origin
        assert_eq!(grid.grid_x_of(-179 * 1200 - 600), 1800);
        assert_eq!(grid.longitude_of(1800), -179 * 1200 - 600);
    }

    #[test]
    fn test_stats() {
        let grid = ElevationGrid::from_samples(2, 2, 0, 0, R, vec![10, VOID_VALUE, -5, 200]);
        let stats = grid.stats();
        assert_eq!(stats.min, Some(-5));
        assert_eq!(stats.max, Some(200));
        assert_eq!(stats.void_count, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.void_fraction(), 0.25);
    }

    #[test]
    fn test_reset_void() {
        let mut grid = ElevationGrid::from_samples(2, 1, 0, 0, R, vec![1, 2]);
        grid.reset_void(0);
        assert_eq!(grid.void_value(), 0);
        assert!(grid.is_void(0, 0) && grid.is_void(1, 0));
    }
}
