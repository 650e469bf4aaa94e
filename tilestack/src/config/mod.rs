//! User configuration stored in `~/.tilestack/config.ini`.
//!
//! The file carries the cache budget, the tile store location, compositing
//! options, logging and one `[layer.<name>]` section per texture layer.
//!
//! # Example
//!
//! ```
//! use tilestack::config::ConfigFile;
//!
//! let config = ConfigFile::from_ini_str(
//!     "[cache]\nvolatile_size = 32MB\n\n[layer.earth]\nsource_dir = earth/bluemarble\n",
//! )
//! .unwrap();
//!
//! assert_eq!(config.cache.volatile_size, 32 * 1024 * 1024);
//! assert_eq!(config.layers[0].source_dir, "earth/bluemarble");
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::{
    config_directory, config_file_path, DEFAULT_LOG_DIR, DEFAULT_STORAGE_DIR,
    DEFAULT_VOLATILE_SIZE,
};
pub use file::ConfigFileError;
pub use settings::{CacheSettings, CompositorSettings, ConfigFile, LoggingSettings, StorageSettings};
pub use size::{format_size, parse_size, SizeParseError};
