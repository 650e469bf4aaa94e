//! Seams between the tile cache and the code that fills it.

use crate::coord::TileId;
use crate::raster::Raster;
use crate::render_state::RenderState;
use crate::tile::StackedTile;

/// Produces composited tiles on a cache miss.
///
/// Implementations must be safe to call from several renderer threads; the
/// cache never calls `build_tile` twice for the same address at once.
pub trait StackedTileBuilder: Send + Sync {
    /// Composites the tile at `id`. Missing data yields placeholder pixels.
    fn build_tile(&self, id: &TileId) -> StackedTile;

    /// Re-composites `tile` with the raw tile `raw_id` replaced by `image`.
    fn rebuild_tile(&self, tile: &StackedTile, raw_id: &TileId, image: Raster) -> StackedTile;

    /// Completeness of the data behind `id`.
    fn render_state(&self, id: &TileId) -> RenderState;
}

/// Receives cache notifications.
pub trait TileCacheListener: Send + Sync {
    /// A tile on display was rebuilt with fresh data.
    fn tile_loaded(&self, id: &TileId);

    /// Every tile was dropped.
    fn cleared(&self);
}
