//! Tile pyramids: one rectangle of tiles per level between two levels.
//!
//! A pyramid is anchored at its bottom (most detailed) level. Every level
//! above it covers the parent tiles of the level below, so the rectangle at
//! level `l` is the bottom rectangle right-shifted by `bottom - l`.

use super::geo::LatLonBox;
use super::level::LevelGeometry;
use super::projection::TileProjection;
use super::types::{TileId, TileRect, TileSize};

/// Rectangles of tiles from `top_level` down to `bottom_level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePyramid {
    top_level: u32,
    bottom_level: u32,
    bottom_rect: TileRect,
    top_rect: TileRect,
}

impl TilePyramid {
    /// Creates an empty pyramid spanning `top_level..=bottom_level`.
    ///
    /// # Panics
    ///
    /// Panics if `top_level > bottom_level`.
    pub fn new(top_level: u32, bottom_level: u32) -> Self {
        assert!(
            top_level <= bottom_level,
            "top level {} is below bottom level {}",
            top_level,
            bottom_level
        );
        Self {
            top_level,
            bottom_level,
            bottom_rect: TileRect::default(),
            top_rect: TileRect::default(),
        }
    }

    /// Sets the rectangle at the bottom level and derives the top one.
    pub fn set_bottom_level_coords(&mut self, rect: TileRect) {
        self.bottom_rect = rect;
        self.top_rect = rect.shifted_right(self.bottom_level - self.top_level);
    }

    /// Builder form of [`set_bottom_level_coords`](Self::set_bottom_level_coords).
    pub fn with_bottom_level_coords(mut self, rect: TileRect) -> Self {
        self.set_bottom_level_coords(rect);
        self
    }

    /// Pyramid covering `bbox` down to `bottom_level`.
    ///
    /// The box is projected onto the pixel raster of the bottom level and the
    /// far edges are rounded up to whole tiles. Boxes crossing the date line
    /// cover every column.
    pub fn from_lat_lon_box(
        bbox: &LatLonBox,
        top_level: u32,
        bottom_level: u32,
        tile_size: TileSize,
        geometry: &LevelGeometry,
        projection: TileProjection,
    ) -> Self {
        let columns = geometry.columns_at(bottom_level).max(1);
        let rows = geometry.rows_at(bottom_level).max(1);
        let extents = projection.pixel_extents(bbox, bottom_level, geometry, tile_size);

        let tile_w = f64::from(tile_size.width.max(1));
        let tile_h = f64::from(tile_size.height.max(1));
        let clamp_col = |v: f64| (v.max(0.0) as u32).min(columns - 1);
        let clamp_row = |v: f64| (v.max(0.0) as u32).min(rows - 1);

        let (x1, x2) = if bbox.crosses_date_line() {
            (0, columns - 1)
        } else {
            (
                clamp_col((extents.left / tile_w).floor()),
                clamp_col((extents.right / tile_w).ceil() - 1.0),
            )
        };
        let y1 = clamp_row((extents.top / tile_h).floor());
        let y2 = clamp_row((extents.bottom / tile_h).ceil() - 1.0);

        Self::new(top_level, bottom_level)
            .with_bottom_level_coords(TileRect::new(x1, y1, x2.max(x1), y2.max(y1)))
    }

    #[inline]
    pub fn top_level(&self) -> u32 {
        self.top_level
    }

    #[inline]
    pub fn bottom_level(&self) -> u32 {
        self.bottom_level
    }

    /// Rectangle at `level`, derived from the bottom rectangle.
    ///
    /// # Panics
    ///
    /// Panics if `level` is outside `top_level..=bottom_level`.
    pub fn coords_at(&self, level: u32) -> TileRect {
        self.check_level(level);
        self.bottom_rect.shifted_right(self.bottom_level - level)
    }

    /// Rectangle at `level` covering the whole area of the top-level tiles.
    ///
    /// Unlike [`coords_at`](Self::coords_at) this expands the top rectangle
    /// downwards, so it may include cells outside the bottom rectangle.
    ///
    /// # Panics
    ///
    /// Panics if `level` is outside `top_level..=bottom_level`.
    pub fn covering_coords_at(&self, level: u32) -> TileRect {
        self.check_level(level);
        let delta = level - self.top_level;
        let top = self.top_rect;
        TileRect::new(
            top.x1() << delta,
            top.y1() << delta,
            ((top.x2() + 1) << delta) - 1,
            ((top.y2() + 1) << delta) - 1,
        )
    }

    /// Tiles in the pyramid, counted as the top rect expanded down every level.
    ///
    /// Saturates at `u64::MAX`.
    pub fn tile_count(&self) -> u64 {
        let top_count = u128::from(self.top_rect.tile_count());
        let mut total: u128 = 0;
        let mut per_level = top_count;
        for _ in self.top_level..=self.bottom_level {
            total = total.saturating_add(per_level);
            per_level = per_level.saturating_mul(4);
        }
        u64::try_from(total).unwrap_or(u64::MAX)
    }

    /// Addresses of every tile at `level` for the given source.
    pub fn tile_ids<'a>(
        &self,
        level: u32,
        source: &'a str,
    ) -> impl Iterator<Item = TileId> + 'a {
        self.coords_at(level)
            .tiles()
            .map(move |(column, row)| TileId::new(source, level, column, row))
    }

    fn check_level(&self, level: u32) {
        assert!(
            (self.top_level..=self.bottom_level).contains(&level),
            "level {} out of pyramid range {}..={}",
            level,
            self.top_level,
            self.bottom_level
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_and_top_coords() {
        let pyramid = TilePyramid::new(2, 5).with_bottom_level_coords(TileRect::new(8, 16, 23, 31));

        assert_eq!(pyramid.coords_at(5), TileRect::new(8, 16, 23, 31));
        assert_eq!(pyramid.coords_at(2), TileRect::new(1, 2, 2, 3));
        assert_eq!(pyramid.coords_at(3), TileRect::new(2, 4, 5, 7));
    }

    #[test]
    fn test_covering_coords_expand_top_rect() {
        let pyramid = TilePyramid::new(2, 5).with_bottom_level_coords(TileRect::new(8, 16, 23, 31));

        assert_eq!(pyramid.covering_coords_at(2), pyramid.coords_at(2));
        assert_eq!(pyramid.covering_coords_at(3), TileRect::new(2, 4, 5, 7));
        assert_eq!(pyramid.covering_coords_at(5), TileRect::new(8, 16, 23, 31));
    }

    #[test]
    fn test_covering_coords_contain_unaligned_bottom() {
        let pyramid = TilePyramid::new(0, 3).with_bottom_level_coords(TileRect::new(3, 1, 4, 2));
        let covering = pyramid.covering_coords_at(3);

        assert_eq!(pyramid.coords_at(0), TileRect::new(0, 0, 0, 0));
        assert_eq!(covering, TileRect::new(0, 0, 7, 7));
        assert!(covering.contains(3, 1) && covering.contains(4, 2));
    }

    #[test]
    fn test_tile_count_sums_powers_of_four() {
        let pyramid = TilePyramid::new(1, 3).with_bottom_level_coords(TileRect::new(4, 0, 7, 3));

        // top rect at level 1 is (1,0)-(1,0): 1 + 4 + 16
        assert_eq!(pyramid.tile_count(), 21);
    }

    #[test]
    fn test_single_level_pyramid() {
        let rect = TileRect::new(0, 0, 2, 1);
        let pyramid = TilePyramid::new(4, 4).with_bottom_level_coords(rect);

        assert_eq!(pyramid.coords_at(4), rect);
        assert_eq!(pyramid.tile_count(), 6);
        assert_eq!(pyramid.tile_ids(4, "earth").count(), 6);
    }

    #[test]
    fn test_tile_count_saturates() {
        let pyramid = TilePyramid::new(0, 40).with_bottom_level_coords(TileRect::new(0, 0, u32::MAX, u32::MAX));
        assert_eq!(pyramid.tile_count(), u64::MAX);
    }

    #[test]
    #[should_panic(expected = "out of pyramid range")]
    fn test_coords_outside_range_panics() {
        let pyramid = TilePyramid::new(2, 4);
        pyramid.coords_at(5);
    }

    #[test]
    #[should_panic(expected = "below bottom level")]
    fn test_inverted_levels_panic() {
        TilePyramid::new(5, 2);
    }

    #[test]
    fn test_from_lat_lon_box_whole_world() {
        let geometry = LevelGeometry::new(2, 1);
        let pyramid = TilePyramid::from_lat_lon_box(
            &LatLonBox::default(),
            0,
            2,
            TileSize::square(256),
            &geometry,
            TileProjection::Equirectangular,
        );

        assert_eq!(pyramid.coords_at(2), TileRect::new(0, 0, 7, 3));
        assert_eq!(pyramid.coords_at(0), TileRect::new(0, 0, 1, 0));
        assert_eq!(pyramid.tile_count(), 2 + 8 + 32);
    }

    #[test]
    fn test_from_lat_lon_box_quadrant() {
        let geometry = LevelGeometry::new(2, 1);
        // north-east quarter of the eastern hemisphere
        let bbox = LatLonBox::from_degrees(90.0, 0.0, 180.0, 90.0);
        let pyramid = TilePyramid::from_lat_lon_box(
            &bbox,
            1,
            2,
            TileSize::square(256),
            &geometry,
            TileProjection::Equirectangular,
        );

        assert_eq!(pyramid.coords_at(2), TileRect::new(6, 0, 7, 1));
    }
}
