//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::coord::{LatLonBox, LevelGeometry, TileProjection, TileSize};
use crate::layer::TextureLayer;

/// Prefix of the per-layer section names.
pub(super) const LAYER_SECTION_PREFIX: &str = "layer.";

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("volatile_size") {
            config.cache.volatile_size = parse_size(v).map_err(|_| {
                ConfigFileError::invalid(
                    "cache",
                    "volatile_size",
                    v,
                    "expected format like '20MB', '512KB' or a byte count",
                )
            })?;
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.storage.directory = expand_tilde(v);
            }
        }
    }

    // [compositor] section
    if let Some(section) = ini.section(Some("compositor")) {
        if let Some(v) = section.get("sun_shading") {
            config.compositor.sun_shading = parse_bool(v);
        }
        if let Some(v) = section.get("city_lights") {
            config.compositor.city_lights = parse_bool(v);
        }
        if let Some(v) = section.get("tile_id") {
            config.compositor.tile_id = parse_bool(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    // [layer.<name>] sections, in file order
    for (name, properties) in ini.iter() {
        let Some(section) = name else {
            continue;
        };
        let Some(layer_name) = section.strip_prefix(LAYER_SECTION_PREFIX) else {
            continue;
        };
        if layer_name.is_empty() {
            return Err(ConfigFileError::invalid(
                section,
                "",
                "",
                "layer sections need a name, e.g. [layer.earth]",
            ));
        }
        config
            .layers
            .push(parse_layer(section, layer_name, properties)?);
    }

    Ok(config)
}

fn parse_layer(
    section: &str,
    name: &str,
    properties: &Properties,
) -> Result<TextureLayer, ConfigFileError> {
    let source_dir = properties
        .get("source_dir")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(name);
    let mut layer = TextureLayer::new(name, source_dir);

    if let Some(v) = properties.get("format") {
        let v = v.trim().trim_start_matches('.').to_lowercase();
        if v.is_empty() {
            return Err(ConfigFileError::invalid(
                section,
                "format",
                &v,
                "must be a file extension such as 'png' or 'jpg'",
            ));
        }
        layer.file_format = v;
    }
    if let Some(v) = properties.get("tile_size") {
        layer.tile_size = parse_tile_size(v).ok_or_else(|| {
            ConfigFileError::invalid(
                section,
                "tile_size",
                v,
                "expected a pixel size like '256' or '675x675'",
            )
        })?;
    }

    let columns = match properties.get("level_zero_columns") {
        Some(v) => parse_positive(section, "level_zero_columns", v)?,
        None => layer.geometry.level_zero_columns,
    };
    let rows = match properties.get("level_zero_rows") {
        Some(v) => parse_positive(section, "level_zero_rows", v)?,
        None => layer.geometry.level_zero_rows,
    };
    layer.geometry = LevelGeometry::new(columns, rows);

    if let Some(v) = properties.get("projection") {
        layer.projection = TileProjection::from_str(v).map_err(|_| {
            ConfigFileError::invalid(
                section,
                "projection",
                v,
                "must be 'equirectangular' or 'mercator'",
            )
        })?;
    }
    if let Some(v) = properties.get("max_level") {
        let v = v.trim();
        if !v.is_empty() {
            layer.maximum_tile_level = Some(v.parse().map_err(|_| {
                ConfigFileError::invalid(section, "max_level", v, "must be a non-negative integer")
            })?);
        }
    }
    if let Some(v) = properties.get("blending") {
        let v = v.trim();
        if !v.is_empty() {
            layer.blending = Some(v.to_string());
        }
    }
    if let Some(v) = properties.get("bbox") {
        let v = v.trim();
        if !v.is_empty() {
            layer.lat_lon_box = Some(parse_bbox(v).ok_or_else(|| {
                ConfigFileError::invalid(
                    section,
                    "bbox",
                    v,
                    "expected 'west,south,east,north' in degrees",
                )
            })?);
        }
    }
    if let Some(v) = properties.get("expire") {
        layer.expire_secs = v.trim().parse().map_err(|_| {
            ConfigFileError::invalid(section, "expire", v, "must be a number of seconds")
        })?;
    }

    Ok(layer)
}

fn parse_positive(section: &str, key: &str, value: &str) -> Result<u32, ConfigFileError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| ConfigFileError::invalid(section, key, value, "must be a positive integer"))
}

/// `"256"` or `"675x675"`.
fn parse_tile_size(value: &str) -> Option<TileSize> {
    let value = value.trim().to_lowercase();
    let (width, height) = match value.split_once('x') {
        Some((w, h)) => (w.trim().parse().ok()?, h.trim().parse().ok()?),
        None => {
            let edge = value.parse().ok()?;
            (edge, edge)
        }
    };
    (width > 0 && height > 0).then_some(TileSize::new(width, height))
}

/// `"west,south,east,north"` in degrees.
fn parse_bbox(value: &str) -> Option<LatLonBox> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let &[west, south, east, north] = parts.as_slice() else {
        return None;
    };
    let in_range = (-90.0..=90.0).contains(&south)
        && (-90.0..=90.0).contains(&north)
        && south <= north
        && (-180.0..=180.0).contains(&west)
        && (-180.0..=180.0).contains(&east);
    in_range.then(|| LatLonBox::from_degrees(north, south, east, west))
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        ConfigFile::from_ini_str(content)
    }

    #[test]
    fn test_sections_overlay_defaults() {
        let config = parse(
            r#"
[cache]
volatile_size = 64MB

[storage]
directory = /srv/tiles

[compositor]
sun_shading = yes
tile_id = 1
"#,
        )
        .unwrap();

        assert_eq!(config.cache.volatile_size, 64 * 1024 * 1024);
        assert_eq!(config.storage.directory, PathBuf::from("/srv/tiles"));
        assert!(config.compositor.sun_shading);
        assert!(!config.compositor.city_lights);
        assert!(config.compositor.tile_id);
        assert_eq!(config.logging.file, "tilestack.log");
    }

    #[test]
    fn test_layers_keep_file_order() {
        let config = parse(
            r#"
[layer.satellite]
source_dir = earth/bluemarble
format = jpg
tile_size = 675x675
projection = equirectangular
max_level = 6

[layer.clouds]
source_dir = earth/clouds
blending = CloudsBlending
bbox = -10,35,30,60
expire = 3600
"#,
        )
        .unwrap();

        assert_eq!(config.layers.len(), 2);
        let satellite = &config.layers[0];
        assert_eq!(satellite.name, "satellite");
        assert_eq!(satellite.source_dir, "earth/bluemarble");
        assert_eq!(satellite.file_format, "jpg");
        assert_eq!(satellite.tile_size, TileSize::square(675));
        assert_eq!(satellite.maximum_tile_level, Some(6));
        assert!(satellite.blending.is_none());

        let clouds = &config.layers[1];
        assert_eq!(clouds.name, "clouds");
        assert_eq!(clouds.blending.as_deref(), Some("CloudsBlending"));
        assert_eq!(clouds.expire_secs, 3600);
        let bbox = clouds.lat_lon_box.unwrap();
        assert!((bbox.west - (-10f64).to_radians()).abs() < 1e-12);
        assert!((bbox.north - 60f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_layer_defaults() {
        let config = parse("[layer.earth]\n").unwrap();
        let layer = &config.layers[0];

        assert_eq!(layer.source_dir, "earth");
        assert_eq!(layer.file_format, "png");
        assert_eq!(layer.geometry, LevelGeometry::new(2, 1));
        assert_eq!(layer.projection, TileProjection::Equirectangular);
        assert!(layer.maximum_tile_level.is_none());
    }

    #[test]
    fn test_mercator_geometry() {
        let config = parse(
            "[layer.osm]\nprojection = Mercator\nlevel_zero_columns = 1\nlevel_zero_rows = 1\n",
        )
        .unwrap();
        let layer = &config.layers[0];

        assert_eq!(layer.projection, TileProjection::Mercator);
        assert_eq!(layer.geometry, LevelGeometry::new(1, 1));
    }

    #[test]
    fn test_invalid_cache_size() {
        let err = parse("[cache]\nvolatile_size = 2TB\n").unwrap_err();

        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref section, ref key, .. }
                if section == "cache" && key == "volatile_size"
        ));
    }

    #[test]
    fn test_invalid_layer_values() {
        let cases = [
            ("projection = conic", "projection"),
            ("tile_size = big", "tile_size"),
            ("level_zero_rows = 0", "level_zero_rows"),
            ("max_level = -1", "max_level"),
            ("bbox = 1,2,3", "bbox"),
            ("bbox = 0,80,10,70", "bbox"),
            ("expire = soon", "expire"),
        ];
        for (line, expected_key) in cases {
            let err = parse(&format!("[layer.earth]\n{}\n", line)).unwrap_err();
            match err {
                ConfigFileError::InvalidValue { section, key, .. } => {
                    assert_eq!(section, "layer.earth");
                    assert_eq!(key, expected_key, "for '{}'", line);
                }
                other => panic!("unexpected error for '{}': {}", line, other),
            }
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" ON "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("maybe"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/maps"), home.join("maps"));
        }
    }
}
