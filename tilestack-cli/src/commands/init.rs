//! Init command - write a default configuration file.

use std::path::PathBuf;

use tilestack::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Arguments for the init command.
pub struct InitArgs {
    pub config: Option<PathBuf>,
    /// Overwrite an existing file
    pub force: bool,
}

/// Run the init command.
pub fn run(args: InitArgs) -> Result<(), CliError> {
    let path = args.config.unwrap_or_else(config_file_path);

    if path.exists() && !args.force {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration: {}", path.display());
    println!("Add a [layer.<name>] section for each texture layer before compositing.");
    Ok(())
}
