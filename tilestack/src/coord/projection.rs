//! Map projections used by tiled texture layers.
//!
//! Positions inside the tile grid are expressed as normalized coordinates:
//! `x` runs from 0 at 180°W to 1 at 180°E, `y` from 0 at the northern edge
//! of the projection to 1 at the southern edge.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use super::geo::LatLonBox;
use super::level::LevelGeometry;
use super::types::{CoordError, TileId, TileSize};

/// Latitude limit of the Mercator projection in radians (about 85.0511°).
pub const MERCATOR_MAX_LAT: f64 = 1.484_422_229_745_332_4;

/// Projection of a tiled layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileProjection {
    /// Plate carrée: rows are linear in latitude
    #[default]
    Equirectangular,
    /// Spherical Mercator: rows are linear in `asinh(tan(lat))`
    Mercator,
}

/// Pixel rectangle in the global raster of one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelExtents {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl TileProjection {
    /// Latitude at normalized row position `y`.
    pub fn lat_at(&self, y: f64) -> f64 {
        match self {
            TileProjection::Equirectangular => FRAC_PI_2 - y * PI,
            TileProjection::Mercator => gudermannian(PI - y * TAU),
        }
    }

    /// Normalized row position of `lat`, clamped to the projection's range.
    pub fn y_at(&self, lat: f64) -> f64 {
        match self {
            TileProjection::Equirectangular => {
                (FRAC_PI_2 - lat.clamp(-FRAC_PI_2, FRAC_PI_2)) / PI
            }
            TileProjection::Mercator => {
                let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
                (PI - lat.tan().asinh()) / TAU
            }
        }
    }

    /// Longitude at normalized column position `x`.
    #[inline]
    pub fn lon_at(&self, x: f64) -> f64 {
        x * TAU - PI
    }

    /// Normalized column position of `lon`.
    #[inline]
    pub fn x_at(&self, lon: f64) -> f64 {
        (lon + PI) / TAU
    }

    /// Latitude of pixel row `row` in the global raster `total_rows` pixels high.
    pub fn row_to_lat(&self, row: f64, total_rows: f64) -> f64 {
        self.lat_at(row / total_rows)
    }

    /// Geographic footprint of a tile.
    pub fn tile_lat_lon_box(&self, id: &TileId, geometry: &LevelGeometry) -> LatLonBox {
        let columns = f64::from(geometry.columns_at(id.level).max(1));
        let rows = f64::from(geometry.rows_at(id.level).max(1));

        let west = self.lon_at(f64::from(id.column) / columns);
        let east = self.lon_at((f64::from(id.column) + 1.0) / columns);
        let north = self.lat_at(f64::from(id.row) / rows);
        let south = self.lat_at((f64::from(id.row) + 1.0) / rows);

        // Constructed directly so the eastern edge of the last column stays at +π
        LatLonBox {
            north,
            south,
            east,
            west,
            rotation: 0.0,
        }
    }

    /// Pixel extents of `bbox` in the global raster of `level`.
    ///
    /// A box crossing the date line extends past the right edge of the raster.
    pub fn pixel_extents(
        &self,
        bbox: &LatLonBox,
        level: u32,
        geometry: &LevelGeometry,
        tile_size: TileSize,
    ) -> PixelExtents {
        let width = f64::from(geometry.columns_at(level)) * f64::from(tile_size.width);
        let height = f64::from(geometry.rows_at(level)) * f64::from(tile_size.height);

        let left = self.x_at(bbox.west) * width;
        let mut right = self.x_at(bbox.east) * width;
        if bbox.crosses_date_line() {
            right += width;
        }

        PixelExtents {
            left,
            top: self.y_at(bbox.north) * height,
            right,
            bottom: self.y_at(bbox.south) * height,
        }
    }
}

impl fmt::Display for TileProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileProjection::Equirectangular => write!(f, "equirectangular"),
            TileProjection::Mercator => write!(f, "mercator"),
        }
    }
}

impl FromStr for TileProjection {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equirectangular" | "equirect" => Ok(TileProjection::Equirectangular),
            "mercator" => Ok(TileProjection::Mercator),
            _ => Err(CoordError::InvalidProjection(s.to_string())),
        }
    }
}

/// The Gudermannian function, mapping Mercator `y` back to latitude.
#[inline]
pub fn gudermannian(y: f64) -> f64 {
    y.sinh().atan()
}
