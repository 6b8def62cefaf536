//! Copying overlapping regions between grids.
//!
//! Grids carry independent origins, so the overlap is computed in geodetic
//! terms. Longitude is circular: the source's offset is taken modulo a full
//! turn and every wrapped position of the source that meets the destination
//! is copied, which covers grids on opposite sides of the antimeridian,
//! sources wider than half a turn and destinations spanning the whole globe.

use tracing::debug;

use crate::coord::normalize;
use crate::grid::ElevationGrid;

impl ElevationGrid {
    /// Copy the part of `source` that overlaps this grid. See [`merge`].
    pub fn merge(&mut self, source: &ElevationGrid) -> usize {
        merge(self, source)
    }
}

/// Copy every sample of `source` that falls inside `destination`.
///
/// Void samples are copied too, and later merges overwrite earlier ones, so
/// the caller decides which tile wins where tiles disagree. Returns the number
/// of destination cells written; grids that do not overlap leave the
/// destination untouched and return 0.
///
/// # Panics
///
/// Panics if the two grids have different resolutions.
pub fn merge(destination: &mut ElevationGrid, source: &ElevationGrid) -> usize {
    assert_eq!(
        destination.resolution(),
        source.resolution(),
        "cannot merge grids of different resolution"
    );

    let resolution = destination.resolution();
    let full_turn = 360 * i64::from(resolution);
    let dest_width = i64::from(destination.width());
    let source_width = i64::from(source.width());

    let bottom = (source.bottom() - destination.bottom()).max(0);
    let top = (source.top() - destination.bottom()).min(destination.height() as i32);
    if top <= bottom {
        return 0;
    }
    let source_bottom = bottom + destination.bottom() - source.bottom();

    // Column of the source's left edge in the destination, modulo a full turn
    let offset = i64::from(normalize(source.left() - destination.left(), resolution));
    let mut shift = offset - full_turn * ((offset + source_width) / full_turn);
    while shift + source_width <= 0 {
        shift += full_turn;
    }

    let mut written = 0;
    // Every wrapped copy of the source that meets the destination
    while shift < dest_width {
        let origin = shift;
        shift += full_turn;
        let left = origin.max(0);
        let right = (origin + source_width).min(dest_width);
        if right <= left {
            continue;
        }

        debug!(
            dest = ?(destination.left(), destination.bottom()),
            source = ?(source.left(), source.bottom()),
            overlap = ?(left, right, bottom, top),
            "Merging grid"
        );

        for y in 0..top - bottom {
            for x in left..right {
                let value = source.get((x - origin) as u32, (y + source_bottom) as u32);
                destination.set(x as u32, (y + bottom) as u32, value);
            }
        }
        written += ((right - left) as usize) * ((top - bottom) as usize);
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VOID_VALUE;

    const R: u32 = 4;

    /// A grid whose samples are distinct: y * 100 + x.
    fn numbered(width: u32, height: u32, left: i32, bottom: i32) -> ElevationGrid {
        let samples = (0..height)
            .flat_map(|y| (0..width).map(move |x| (y * 100 + x) as i16))
            .collect();
        ElevationGrid::from_samples(width, height, left, bottom, R, samples)
    }

    #[test]
    fn test_merge_into_self_is_noop() {
        let mut grid = numbered(5, 5, 8, -4);
        let copy = grid.clone();
        let written = grid.merge(&copy);
        assert_eq!(written, 25);
        assert_eq!(grid, copy);
    }

    #[test]
    fn test_merge_disjoint_changes_nothing() {
        let mut dest = ElevationGrid::new(5, 5, 0, 0, R);
        let before = dest.clone();

        // east of the destination
        assert_eq!(dest.merge(&numbered(5, 5, 20, 0)), 0);
        // north of the destination
        assert_eq!(dest.merge(&numbered(5, 5, 0, 5)), 0);
        // touching edge only
        assert_eq!(dest.merge(&numbered(5, 5, -5, 0)), 0);

        assert_eq!(dest, before);
    }

    #[test]
    fn test_merge_partial_overlap() {
        let mut dest = ElevationGrid::new(4, 4, 0, 0, R);
        // source covers dest columns 2..4 and rows 1..4
        let source = numbered(3, 3, 2, 1);

        let written = dest.merge(&source);
        assert_eq!(written, 2 * 3);
        assert_eq!(dest.get(2, 1), source.get(0, 0));
        assert_eq!(dest.get(3, 3), source.get(1, 2));
        assert_eq!(dest.get(1, 1), VOID_VALUE);
        assert_eq!(dest.get(2, 0), VOID_VALUE);
    }

    #[test]
    fn test_merge_source_larger_than_destination() {
        let mut dest = ElevationGrid::new(2, 2, 4, 4, R);
        let source = numbered(10, 10, 0, 0);

        assert_eq!(dest.merge(&source), 4);
        assert_eq!(dest.get(0, 0), source.get(4, 4));
        assert_eq!(dest.get(1, 1), source.get(5, 5));
    }

    #[test]
    fn test_merge_copies_void() {
        let mut dest = numbered(3, 3, 0, 0);
        let source = ElevationGrid::new(1, 1, 1, 1, R);
        dest.merge(&source);
        assert_eq!(dest.get(1, 1), VOID_VALUE);
        assert_eq!(dest.get(0, 0), 0);
    }

    #[test]
    fn test_later_merge_wins() {
        let mut dest = ElevationGrid::new(3, 1, 0, 0, R);
        let first = ElevationGrid::from_samples(2, 1, 0, 0, R, vec![1, 1]);
        let second = ElevationGrid::from_samples(2, 1, 1, 0, R, vec![2, 2]);
        dest.merge(&first);
        dest.merge(&second);
        assert_eq!(dest.samples(), &[1, 2, 2]);
    }

    #[test]
    fn test_merge_across_dateline() {
        // R = 4: the antimeridian is at 720 grid units
        let half = 180 * R as i32;
        // destination spans 179°E..181°E
        let mut dest = ElevationGrid::new(2 * R, 1, half - R as i32, 0, R);
        let east = ElevationGrid::from_samples(R, 1, half - R as i32, 0, R, vec![1, 2, 3, 4]);
        // 180°W..179°W lies on the far side of the wrap
        let west = ElevationGrid::from_samples(R, 1, -half, 0, R, vec![5, 6, 7, 8]);

        assert_eq!(dest.merge(&east), 4);
        assert_eq!(dest.merge(&west), 4);
        assert_eq!(dest.samples(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_merge_wide_source_covering_destination() {
        // 340° wide from 170°W, so its left edge is nearer the far side
        let source = ElevationGrid::from_samples(
            340 * R,
            1,
            -170 * R as i32,
            0,
            R,
            vec![5; (340 * R) as usize],
        );
        let mut dest = ElevationGrid::new(R, 1, 100 * R as i32, 0, R);

        assert_eq!(dest.merge(&source), R as usize);
        assert_eq!(dest.samples(), &[5, 5, 5, 5]);
    }

    #[test]
    fn test_merge_into_full_turn_destination() {
        let half = 180 * R as i32;
        let mut dest = ElevationGrid::new(360 * R, 1, -half, 0, R);
        // 179°E..180°E including the shared edge on the antimeridian
        let tile = numbered(R + 1, 1, half - R as i32, 0);

        assert_eq!(dest.merge(&tile), (R + 1) as usize);
        for i in 0..R {
            assert_eq!(dest.get(359 * R + i, 0), i as i16);
        }
        assert_eq!(dest.get(0, 0), R as i16);
        assert_eq!(dest.stats().void_count, u64::from(360 * R - R - 1));
    }

    #[test]
    fn test_merge_tiles_into_mosaic() {
        // Two 5×5 tiles sharing an edge column, merged into a 9×5 block
        let mut dest = ElevationGrid::new(9, 5, 0, 0, R);
        let west = ElevationGrid::from_samples(5, 5, 0, 0, R, vec![1; 25]);
        let east = ElevationGrid::from_samples(5, 5, 4, 0, R, vec![2; 25]);
        dest.merge(&west);
        dest.merge(&east);

        assert_eq!(dest.get(3, 2), 1);
        assert_eq!(dest.get(4, 2), 2);
        assert_eq!(dest.get(8, 4), 2);
        assert_eq!(dest.stats().void_count, 0);
    }

    #[test]
    #[should_panic(expected = "different resolution")]
    fn test_merge_resolution_mismatch_panics() {
        let mut dest = ElevationGrid::new(4, 4, 0, 0, 4);
        let source = ElevationGrid::new(4, 4, 0, 0, 8);
        dest.merge(&source);
    }
}
