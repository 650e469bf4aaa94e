//! Pyramid command - tile ranges covering a geographic box.

use std::path::PathBuf;

use tilestack::config::{config_file_path, ConfigFile};
use tilestack::coord::{LatLonBox, TilePyramid};
use tilestack::layer::TextureLayer;

use crate::error::CliError;

/// Arguments for the pyramid command.
pub struct PyramidArgs {
    pub top: u32,
    pub bottom: u32,
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub config: Option<PathBuf>,
}

/// Run the pyramid command.
pub fn run(args: PyramidArgs) -> Result<(), CliError> {
    let pyramid = build_pyramid(&args)?;
    let layer = reference_layer(&args)?;

    println!(
        "Levels {}..={} for box W {} S {} E {} N {}",
        args.top, args.bottom, args.west, args.south, args.east, args.north
    );
    println!(
        "Grid of layer '{}': {}x{} at level 0, {}, {} tiles",
        layer.name,
        layer.geometry.level_zero_columns,
        layer.geometry.level_zero_rows,
        layer.projection,
        layer.tile_size
    );
    println!();

    for level in pyramid.top_level()..=pyramid.bottom_level() {
        let rect = pyramid.coords_at(level);
        println!(
            "  level {:>2}: columns {}..={}, rows {}..={} ({} tiles)",
            level,
            rect.x1(),
            rect.x2(),
            rect.y1(),
            rect.y2(),
            rect.tile_count()
        );
    }

    println!();
    println!("Total: {} tiles", pyramid.tile_count());
    Ok(())
}

fn build_pyramid(args: &PyramidArgs) -> Result<TilePyramid, CliError> {
    if args.top > args.bottom {
        return Err(CliError::InvalidArgument(format!(
            "top level {} is below bottom level {}",
            args.top, args.bottom
        )));
    }
    let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
    let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
    if !(lat_ok(args.south) && lat_ok(args.north) && lon_ok(args.west) && lon_ok(args.east)) {
        return Err(CliError::InvalidArgument(
            "latitudes must lie in -90..=90 and longitudes in -180..=180".to_string(),
        ));
    }
    if args.south > args.north {
        return Err(CliError::InvalidArgument(format!(
            "south {} is north of north {}",
            args.south, args.north
        )));
    }

    let layer = reference_layer(args)?;
    let bbox = LatLonBox::from_degrees(args.north, args.south, args.east, args.west);
    Ok(TilePyramid::from_lat_lon_box(
        &bbox,
        args.top,
        args.bottom,
        layer.tile_size,
        &layer.geometry,
        layer.projection,
    ))
}

/// First configured layer, or a default 2x1 equirectangular layer.
fn reference_layer(args: &PyramidArgs) -> Result<TextureLayer, CliError> {
    let path = args.config.clone().unwrap_or_else(config_file_path);
    let config = ConfigFile::load_from(&path)?;
    Ok(config
        .layers
        .into_iter()
        .next()
        .unwrap_or_else(|| TextureLayer::new("default", "default")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(temp: &TempDir) -> PyramidArgs {
        PyramidArgs {
            top: 0,
            bottom: 2,
            west: -180.0,
            south: -90.0,
            east: 180.0,
            north: 90.0,
            config: Some(temp.path().join("missing.ini")),
        }
    }

    #[test]
    fn test_whole_world_on_default_grid() {
        let temp = TempDir::new().unwrap();
        let pyramid = build_pyramid(&args(&temp)).unwrap();

        // 2x1 at level 0, 8x4 at level 2
        let rect = pyramid.coords_at(2);
        assert_eq!((rect.x1(), rect.y1(), rect.x2(), rect.y2()), (0, 0, 7, 3));
        assert_eq!(pyramid.tile_count(), 2 + 8 + 32);
    }

    #[test]
    fn test_rejects_inverted_levels() {
        let temp = TempDir::new().unwrap();
        let mut args = args(&temp);
        args.top = 3;

        assert!(matches!(
            build_pyramid(&args),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_latitude() {
        let temp = TempDir::new().unwrap();
        let mut args = args(&temp);
        args.north = 95.0;

        assert!(build_pyramid(&args).is_err());
    }

    #[test]
    fn test_uses_first_configured_layer() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(
            &path,
            "[layer.osm]\nprojection = mercator\nlevel_zero_columns = 1\nlevel_zero_rows = 1\n",
        )
        .unwrap();
        let mut args = args(&temp);
        args.config = Some(path);
        args.north = 85.0;
        args.south = -85.0;

        let pyramid = build_pyramid(&args).unwrap();

        let rect = pyramid.coords_at(2);
        assert_eq!((rect.x1(), rect.y1(), rect.x2(), rect.y2()), (0, 0, 3, 3));
    }
}
