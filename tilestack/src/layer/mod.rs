//! Texture layer and ground overlay descriptions.
//!
//! A [`TextureLayer`] describes one tiled image source that takes part in
//! compositing: where its tiles live, how its grid is laid out and how it is
//! blended onto the layers below. A [`GroundOverlay`] is a single georeferenced
//! image painted on top of the composited tiles.

mod overlay;

pub use overlay::GroundOverlay;

use crate::blend::Blending;
use crate::coord::{LatLonBox, LevelGeometry, TileId, TileProjection, TileSize};

/// Default tile lifetime before a stored tile counts as expired (one year).
pub const DEFAULT_EXPIRE_SECS: u64 = 31_536_000;

/// One tiled image source of a map theme.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureLayer {
    /// Layer name, used in logs and configuration
    pub name: String,
    /// Directory under the storage root, also the source id of its tiles
    pub source_dir: String,
    /// File extension of stored tiles (`png`, `jpg`)
    pub file_format: String,
    pub tile_size: TileSize,
    pub geometry: LevelGeometry,
    pub projection: TileProjection,
    /// Deepest level that has tiles; `None` means unbounded
    pub maximum_tile_level: Option<u32>,
    /// Blending name; `None` copies the layer over the ones below
    pub blending: Option<String>,
    /// Area covered by the layer; `None` means the whole globe
    pub lat_lon_box: Option<LatLonBox>,
    pub expire_secs: u64,
}

impl TextureLayer {
    pub fn new(name: impl Into<String>, source_dir: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_dir: source_dir.into(),
            file_format: "png".to_string(),
            tile_size: TileSize::default(),
            geometry: LevelGeometry::default(),
            projection: TileProjection::default(),
            maximum_tile_level: None,
            blending: None,
            lat_lon_box: None,
            expire_secs: DEFAULT_EXPIRE_SECS,
        }
    }

    pub fn with_file_format(mut self, format: impl Into<String>) -> Self {
        self.file_format = format.into();
        self
    }

    pub fn with_tile_size(mut self, tile_size: TileSize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_geometry(mut self, geometry: LevelGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_projection(mut self, projection: TileProjection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_maximum_tile_level(mut self, level: u32) -> Self {
        self.maximum_tile_level = Some(level);
        self
    }

    pub fn with_blending(mut self, blending: impl Into<String>) -> Self {
        self.blending = Some(blending.into());
        self
    }

    pub fn with_lat_lon_box(mut self, bbox: LatLonBox) -> Self {
        self.lat_lon_box = Some(bbox);
        self
    }

    pub fn with_expire_secs(mut self, secs: u64) -> Self {
        self.expire_secs = secs;
        self
    }

    /// Address of this layer's tile for the cell of `id`.
    pub fn raw_tile_id(&self, id: &TileId) -> TileId {
        id.with_source(self.source_dir.as_str())
    }

    /// Resolved blend mode. Unknown names resolve to `None`.
    pub fn blending_mode(&self) -> Option<Blending> {
        self.blending.as_deref().and_then(Blending::from_name)
    }

    /// Whether the layer has tiles at `level`.
    pub fn provides_level(&self, level: u32) -> bool {
        self.maximum_tile_level.map_or(true, |max| max >= level)
    }

    /// Whether the layer's area intersects `footprint`.
    pub fn covers(&self, footprint: &LatLonBox) -> bool {
        self.lat_lon_box
            .as_ref()
            .map_or(true, |bbox| bbox.intersects(footprint))
    }

    /// Theme identifier shown in the tile-id overlay.
    pub fn theme_id(&self) -> String {
        format!("maps/{}", self.source_dir)
    }
}
