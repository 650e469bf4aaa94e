//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tilestack::config::ConfigFileError;
use tilestack::raster::RasterError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// A command-line value is out of range or malformed
    InvalidArgument(String),
    /// No texture layer is configured
    NoLayers { config_path: String },
    /// Failed to write the composited image
    ImageWrite { path: String, error: RasterError },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::NoLayers { .. } => {
                eprintln!();
                eprintln!("Add at least one texture layer to the config file, e.g.:");
                eprintln!("  [layer.earth]");
                eprintln!("  source_dir = earth/bluemarble");
                eprintln!("  format = jpg");
            }
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Run 'tilestack init --force' to write a fresh default configuration.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }

    /// Process exit code: 2 for usage problems, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::NoLayers { config_path } => {
                write!(f, "No texture layers configured in '{}'", config_path)
            }
            CliError::ImageWrite { path, error } => {
                write!(f, "Failed to write image '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::ImageWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}
