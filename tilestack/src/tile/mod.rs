//! Tiles held by the cache.
//!
//! A [`TextureTile`] is one layer's image for one cell. A [`StackedTile`] is
//! the composite of all relevant layers for that cell, built by the
//! compositor and served to the renderer.
//!
//! ```text
//!   TextureTile (layer A) ──┐
//!   TextureTile (layer B) ──┼──▶ LayerCompositor ──▶ StackedTile ──▶ TileCache
//!   TextureTile (layer C) ──┘
//! ```

mod stacked;
mod texture;

pub use stacked::StackedTile;
pub use texture::TextureTile;
