//! tilestack - tile pyramid cache and compositing engine
//!
//! Builds composited tiles for a map renderer from several tiled texture
//! layers, keeps them in a memory-bounded cache shared by renderer threads,
//! and reports how complete the underlying data is.
//!
//! # High-Level API
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tilestack::cache::TileCache;
//! use tilestack::compositor::LayerCompositor;
//! use tilestack::coord::TileId;
//! use tilestack::layer::TextureLayer;
//! use tilestack::source::FileTileSource;
//! use tilestack::sun::SunLocator;
//!
//! let source = Arc::new(FileTileSource::new("/srv/tiles"));
//! let compositor = Arc::new(LayerCompositor::new(source, Arc::new(SunLocator::now())));
//! compositor.set_texture_layers(vec![TextureLayer::new("earth", "earth/bluemarble")]);
//!
//! let cache = TileCache::new(compositor);
//! cache.reset_usage_marks();
//! let tile = cache.load_tile(&TileId::stacked(1, 2, 0));
//! cache.evict_unused();
//! # let _ = tile;
//! ```

pub mod blend;
pub mod cache;
pub mod compositor;
pub mod config;
pub mod coord;
pub mod layer;
pub mod logging;
pub mod raster;
pub mod render_state;
pub mod source;
pub mod sun;
pub mod tile;

/// Version of the tilestack library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
