//! Tile addressing and pyramid geometry
//!
//! Provides the value types used to address tiles ([`TileId`]), the level
//! geometry of a tiled layer ([`LevelGeometry`]), rectangles of tiles across a
//! range of levels ([`TilePyramid`]) and the geographic helpers needed to map
//! tiles onto the globe ([`LatLonBox`], [`TileProjection`]).

mod geo;
mod level;
mod projection;
mod pyramid;
mod types;

pub use geo::{normalize_lat, normalize_lon, LatLonBox};
pub use level::LevelGeometry;
pub use projection::{gudermannian, PixelExtents, TileProjection, MERCATOR_MAX_LAT};
pub use pyramid::TilePyramid;
pub use types::{CoordError, TileId, TileRect, TileRectIter, TileSize, STACKED_SOURCE};
