//! Settings structs for the sections of the configuration file.
//!
//! Each struct mirrors one `[section]`; texture layers come from the
//! `[layer.<name>]` sections in file order.

use std::path::PathBuf;

use crate::layer::TextureLayer;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub storage: StorageSettings,
    pub compositor: CompositorSettings,
    pub logging: LoggingSettings,
    /// Texture layers in blend order
    pub layers: Vec<TextureLayer>,
}

/// Stacked tile cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Byte budget of the evictable tier
    pub volatile_size: usize,
}

/// Tile storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Root under which each layer keeps its `source_dir`
    pub directory: PathBuf,
}

/// Compositing options applied to every tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositorSettings {
    pub sun_shading: bool,
    /// Night side shows city lights instead of darkening
    pub city_lights: bool,
    /// Paint the tile address onto each tile
    pub tile_id: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}
