//! tilestack CLI - command-line interface
//!
//! Composites tiles from the configured texture layers, plans region
//! downloads and writes the default configuration.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::composite::CompositeArgs;
use commands::init::InitArgs;
use commands::pyramid::PyramidArgs;

#[derive(Parser)]
#[command(name = "tilestack")]
#[command(version = tilestack::VERSION)]
#[command(about = "Composite and cache multi-layer map tiles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite one tile from every configured layer and save it as PNG
    Composite {
        /// Zoom level, 0 is the coarsest
        #[arg(long)]
        level: u32,

        /// Tile column (west to east)
        #[arg(long)]
        column: u32,

        /// Tile row (north to south)
        #[arg(long)]
        row: u32,

        /// Output PNG path
        #[arg(long)]
        output: PathBuf,

        /// Config file (default: ~/.tilestack/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Darken the night side
        #[arg(long)]
        sun_shading: bool,

        /// Show city lights instead of darkening the night side
        #[arg(long)]
        city_lights: bool,

        /// Paint the tile address onto the tile
        #[arg(long)]
        tile_id: bool,

        /// Time of day for sun shading, RFC 3339 (default: now)
        #[arg(long)]
        time: Option<String>,

        /// Print cache statistics afterwards
        #[arg(long)]
        stats: bool,
    },

    /// Print the tile ranges covering a geographic box, level by level
    Pyramid {
        /// Coarsest level
        #[arg(long)]
        top: u32,

        /// Finest level
        #[arg(long)]
        bottom: u32,

        /// West edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        west: f64,

        /// South edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        south: f64,

        /// East edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        east: f64,

        /// North edge in degrees
        #[arg(long, allow_hyphen_values = true)]
        north: f64,

        /// Config file whose first layer defines the grid
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Config file (default: ~/.tilestack/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Composite {
            level,
            column,
            row,
            output,
            config,
            sun_shading,
            city_lights,
            tile_id,
            time,
            stats,
        } => commands::composite::run(CompositeArgs {
            level,
            column,
            row,
            output,
            config,
            sun_shading,
            city_lights,
            tile_id,
            time,
            stats,
        }),
        Commands::Pyramid {
            top,
            bottom,
            west,
            south,
            east,
            north,
            config,
        } => commands::pyramid::run(PyramidArgs {
            top,
            bottom,
            west,
            south,
            east,
            north,
            config,
        }),
        Commands::Init { config, force } => commands::init::run(InitArgs { config, force }),
    };

    if let Err(e) = result {
        e.exit();
    }
}
