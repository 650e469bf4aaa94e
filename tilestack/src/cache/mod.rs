//! Two-tier cache of composited tiles.
//!
//! Tiles on display stay in memory while a render pass uses them. Unused
//! tiles move to a byte-budgeted evictable tier and are dropped oldest-first.
//! Misses are filled through the [`StackedTileBuilder`] seam.

mod builder;
mod evictable;
mod stats;
mod tile_cache;

pub use builder::{StackedTileBuilder, TileCacheListener};
pub use evictable::{EvictableCache, Insertion};
pub use stats::{CacheStatistics, CacheStats};
pub use tile_cache::{TileCache, DEFAULT_BYTE_BUDGET};
