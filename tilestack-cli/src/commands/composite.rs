//! Composite command - build one stacked tile and save it as PNG.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tilestack::coord::TileId;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the composite command.
pub struct CompositeArgs {
    pub level: u32,
    pub column: u32,
    pub row: u32,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub sun_shading: bool,
    pub city_lights: bool,
    pub tile_id: bool,
    /// RFC 3339 time for sun shading; now if absent
    pub time: Option<String>,
    pub stats: bool,
}

/// Run the composite command.
pub fn run(args: CompositeArgs) -> Result<(), CliError> {
    let time = parse_time(args.time.as_deref())?;

    let runner = CliRunner::new(args.config.as_deref())?;
    runner.log_startup("composite");
    runner.require_layers()?;

    let (downloads, requests) = mpsc::channel();
    let pipeline = runner.build_pipeline(downloads);
    let compositor = &pipeline.compositor;

    if args.sun_shading {
        compositor.set_show_sun_shading(true);
    }
    if args.city_lights {
        compositor.set_show_city_lights(true);
    }
    if args.tile_id {
        compositor.set_show_tile_id(true);
    }
    pipeline.sun.update(time);

    let columns = compositor.tile_column_count(args.level);
    let rows = compositor.tile_row_count(args.level);
    if args.column >= columns || args.row >= rows {
        return Err(CliError::InvalidArgument(format!(
            "tile {}/{}/{} is outside the {}x{} grid of level {}",
            args.level, args.column, args.row, columns, rows, args.level
        )));
    }

    let id = TileId::stacked(args.level, args.column, args.row);
    println!("Compositing tile {} ({} layers)", id, compositor.texture_layer_count());

    let start = Instant::now();
    let cache = &pipeline.cache;
    cache.reset_usage_marks();
    let tile = cache.load_tile(&id);
    cache.evict_unused();
    let elapsed = start.elapsed();

    tile.image()
        .save_png(&args.output)
        .map_err(|error| CliError::ImageWrite {
            path: args.output.display().to_string(),
            error,
        })?;

    println!(
        "Wrote {}x{} image to {} in {:.1}ms",
        tile.image().width(),
        tile.image().height(),
        args.output.display(),
        elapsed.as_secs_f64() * 1000.0
    );
    println!();
    print!("{}", cache.render_state().format());

    let queued: Vec<_> = requests.try_iter().collect();
    println!();
    println!("Download requests queued: {}", queued.len());
    for request in &queued {
        println!("  {} -> {}", request.id_string(), request.relative_path.display());
    }

    if args.stats {
        println!();
        print!("{}", cache.stats().format());
    }

    Ok(())
}

fn parse_time(time: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    match time {
        None => Ok(Utc::now()),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                CliError::InvalidArgument(format!(
                    "time '{}' is not RFC 3339 (e.g. 2024-06-21T12:00:00Z): {}",
                    value, e
                ))
            }),
    }
}
