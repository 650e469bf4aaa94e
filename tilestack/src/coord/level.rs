//! Level geometry: how many tiles make up each zoom level.

use tracing::warn;

use super::types::{CoordError, TileId};

/// Size of the level-zero grid of a tile pyramid.
///
/// Every level doubles the column and row count of the level above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelGeometry {
    pub level_zero_columns: u32,
    pub level_zero_rows: u32,
}

impl Default for LevelGeometry {
    /// Two columns by one row, the usual equirectangular layout.
    fn default() -> Self {
        Self::new(2, 1)
    }
}

impl LevelGeometry {
    pub const fn new(level_zero_columns: u32, level_zero_rows: u32) -> Self {
        Self {
            level_zero_columns,
            level_zero_rows,
        }
    }

    /// Deepest level whose column and row counts fit in a `u32`.
    ///
    /// Up to this level `level_from_columns(columns_at(level)) == level`.
    /// Deeper levels report saturated counts and no longer round-trip. A zero
    /// level-zero count never saturates.
    pub fn maximum_level(&self) -> u32 {
        self.level_zero_columns
            .leading_zeros()
            .min(self.level_zero_rows.leading_zeros())
    }

    /// Number of tile columns at `level`, saturating at `u32::MAX` past
    /// [`maximum_level`](LevelGeometry::maximum_level).
    #[inline]
    pub fn columns_at(&self, level: u32) -> u32 {
        shift_saturating(self.level_zero_columns, level)
    }

    /// Number of tile rows at `level`, saturating at `u32::MAX` past
    /// [`maximum_level`](LevelGeometry::maximum_level).
    #[inline]
    pub fn rows_at(&self, level: u32) -> u32 {
        shift_saturating(self.level_zero_rows, level)
    }

    /// Level whose column count is `columns`.
    ///
    /// Counts that are not an exact power-of-two multiple round down to the
    /// level below.
    pub fn level_from_columns(&self, columns: u32) -> Result<u32, CoordError> {
        level_from_count(self.level_zero_columns, columns)
    }

    /// Level whose row count is `rows`.
    pub fn level_from_rows(&self, rows: u32) -> Result<u32, CoordError> {
        level_from_count(self.level_zero_rows, rows)
    }

    /// Returns true if the address lies inside the grid of its level.
    pub fn contains(&self, id: &TileId) -> bool {
        id.column < self.columns_at(id.level) && id.row < self.rows_at(id.level)
    }
}

fn shift_saturating(base: u32, level: u32) -> u32 {
    if base == 0 {
        return 0;
    }
    if level > base.leading_zeros() {
        return u32::MAX;
    }
    base << level
}

fn level_from_count(level_zero: u32, count: u32) -> Result<u32, CoordError> {
    if level_zero == 0 {
        warn!(count, "level-zero tile count is zero");
        return Err(CoordError::EmptyLevelZero);
    }
    if count < level_zero {
        warn!(level_zero, count, "tile count is below the level-zero count");
        return Err(CoordError::InvalidLevelGeometry { level_zero, count });
    }
    Ok((count / level_zero).ilog2())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_and_rows_double_per_level() {
        let geometry = LevelGeometry::new(2, 1);

        assert_eq!(geometry.columns_at(0), 2);
        assert_eq!(geometry.rows_at(0), 1);
        assert_eq!(geometry.columns_at(3), 16);
        assert_eq!(geometry.rows_at(3), 8);
    }

    #[test]
    fn test_level_round_trip() {
        let geometry = LevelGeometry::new(2, 1);

        for level in 0..20 {
            assert_eq!(
                geometry.level_from_columns(geometry.columns_at(level)),
                Ok(level)
            );
            assert_eq!(geometry.level_from_rows(geometry.rows_at(level)), Ok(level));
        }
    }

    #[test]
    fn test_round_trip_up_to_maximum_level() {
        for geometry in [
            LevelGeometry::new(2, 1),
            LevelGeometry::new(1, 1),
            LevelGeometry::new(3, 5),
        ] {
            let maximum = geometry.maximum_level();
            for level in 0..=maximum {
                assert_eq!(
                    geometry.level_from_columns(geometry.columns_at(level)),
                    Ok(level),
                    "{:?} level {}",
                    geometry,
                    level
                );
                assert_eq!(geometry.level_from_rows(geometry.rows_at(level)), Ok(level));
            }
            let deeper = maximum + 1;
            assert_eq!(
                geometry.columns_at(deeper).max(geometry.rows_at(deeper)),
                u32::MAX
            );
        }
    }

    #[test]
    fn test_maximum_level() {
        assert_eq!(LevelGeometry::new(2, 1).maximum_level(), 30);
        assert_eq!(LevelGeometry::new(1, 1).maximum_level(), 31);
        assert_eq!(LevelGeometry::new(3, 5).maximum_level(), 29);
    }

    #[test]
    fn test_level_from_non_power_rounds_down() {
        let geometry = LevelGeometry::new(2, 1);
        assert_eq!(geometry.level_from_columns(12), Ok(2));
    }

    #[test]
    fn test_zero_level_zero_is_error() {
        let geometry = LevelGeometry::new(0, 1);
        assert_eq!(
            geometry.level_from_columns(8),
            Err(CoordError::EmptyLevelZero)
        );
        assert_eq!(geometry.columns_at(5), 0);
    }

    #[test]
    fn test_count_below_level_zero_is_error() {
        let geometry = LevelGeometry::new(4, 2);
        assert!(matches!(
            geometry.level_from_rows(1),
            Err(CoordError::InvalidLevelGeometry { .. })
        ));
    }

    #[test]
    fn test_counts_saturate_instead_of_overflowing() {
        let geometry = LevelGeometry::new(3, 1);
        assert_eq!(geometry.columns_at(40), u32::MAX);
        assert_eq!(geometry.rows_at(31), 1 << 31);
        assert_eq!(geometry.rows_at(32), u32::MAX);
    }

    #[test]
    fn test_contains() {
        let geometry = LevelGeometry::new(2, 1);
        assert!(geometry.contains(&TileId::stacked(1, 3, 1)));
        assert!(!geometry.contains(&TileId::stacked(1, 4, 1)));
        assert!(!geometry.contains(&TileId::stacked(1, 0, 2)));
    }
}
