//! Default values for configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::cache::DEFAULT_BYTE_BUDGET;
use crate::logging::default_log_file;

/// Default byte budget of the evictable cache tier.
pub const DEFAULT_VOLATILE_SIZE: usize = DEFAULT_BYTE_BUDGET;

/// Name of the storage directory under the config directory.
pub const DEFAULT_STORAGE_DIR: &str = "maps";

/// Name of the log directory under the config directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Path to the config directory (~/.tilestack).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilestack")
}

/// Path to the config file (~/.tilestack/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();
        Self {
            cache: CacheSettings {
                volatile_size: DEFAULT_VOLATILE_SIZE,
            },
            storage: StorageSettings {
                directory: config_dir.join(DEFAULT_STORAGE_DIR),
            },
            compositor: CompositorSettings::default(),
            logging: LoggingSettings {
                directory: config_dir.join(DEFAULT_LOG_DIR),
                file: default_log_file().to_string(),
            },
            layers: Vec::new(),
        }
    }
}
