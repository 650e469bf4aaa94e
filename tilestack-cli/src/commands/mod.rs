//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`composite`] - Composite one tile from the configured layers
//! - [`init`] - Configuration initialization
//! - [`pyramid`] - Tile ranges covering a geographic box

pub mod composite;
pub mod init;
pub mod pyramid;
