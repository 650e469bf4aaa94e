//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and wiring of the
//! tile source, compositor and cache shared by the command handlers.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use tilestack::cache::{StackedTileBuilder, TileCache};
use tilestack::compositor::LayerCompositor;
use tilestack::config::{config_file_path, ConfigFile};
use tilestack::logging::{init_logging, LoggingGuard};
use tilestack::source::{DownloadRequest, FileTileSource};
use tilestack::sun::SunLocator;
use tracing::info;

use crate::error::CliError;

/// Tile source, compositor and cache built from the configuration.
pub struct Pipeline {
    pub sun: Arc<SunLocator>,
    pub compositor: Arc<LayerCompositor>,
    pub cache: TileCache,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Loads the config (defaults if absent) and initializes logging.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tilestack v{}", tilestack::VERSION);
        info!(
            config = %self.config_path.display(),
            layers = self.config.layers.len(),
            "tilestack CLI: {} command",
            command
        );
    }

    /// Fails with a helpful message when no layer is configured.
    pub fn require_layers(&self) -> Result<(), CliError> {
        if self.config.layers.is_empty() {
            return Err(CliError::NoLayers {
                config_path: self.config_path.display().to_string(),
            });
        }
        Ok(())
    }

    /// Wires a file-backed source, the compositor and the cache.
    ///
    /// Download requests raised while compositing are sent to `downloads`.
    pub fn build_pipeline(&self, downloads: Sender<DownloadRequest>) -> Pipeline {
        let source = Arc::new(
            FileTileSource::new(&self.config.storage.directory).with_download_sender(downloads),
        );
        let sun = Arc::new(SunLocator::now());

        let compositor = Arc::new(LayerCompositor::new(source, Arc::clone(&sun)));
        compositor.set_texture_layers(self.config.layers.clone());
        compositor.set_show_sun_shading(self.config.compositor.sun_shading);
        compositor.set_show_city_lights(self.config.compositor.city_lights);
        compositor.set_show_tile_id(self.config.compositor.tile_id);

        let builder: Arc<dyn StackedTileBuilder> = compositor.clone();
        let cache = TileCache::with_byte_budget(builder, self.config.cache.volatile_size);

        Pipeline {
            sun,
            compositor,
            cache,
        }
    }
}
