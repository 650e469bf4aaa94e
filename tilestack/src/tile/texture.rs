//! Raw per-layer tiles.

use crate::blend::Blending;
use crate::coord::TileId;
use crate::raster::Raster;

/// One layer's image for one cell, as loaded from the tile source.
///
/// Shared between the composited tiles that use it through `Arc`.
#[derive(Debug, Clone)]
pub struct TextureTile {
    id: TileId,
    image: Raster,
    blending: Option<Blending>,
}

impl TextureTile {
    pub fn new(id: TileId, image: Raster, blending: Option<Blending>) -> Self {
        Self {
            id,
            image,
            blending,
        }
    }

    #[inline]
    pub fn id(&self) -> &TileId {
        &self.id
    }

    #[inline]
    pub fn image(&self) -> &Raster {
        &self.image
    }

    /// How this tile is combined with the layers below it.
    ///
    /// `None` means the tile replaces whatever is below.
    #[inline]
    pub fn blending(&self) -> Option<&Blending> {
        self.blending.as_ref()
    }

    pub fn byte_count(&self) -> usize {
        self.image.byte_count()
    }
}
