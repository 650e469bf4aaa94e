//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented representation written to `config.ini`.

use std::fmt::Write;
use std::path::Path;

use super::parser::LAYER_SECTION_PREFIX;
use super::settings::ConfigFile;
use super::size::format_size;
use crate::layer::TextureLayer;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let mut out = format!(
        r#"[cache]
; Memory kept for composited tiles that are no longer on screen
; Supports: KB, MB, GB suffixes (e.g., 512KB, 20MB)
volatile_size = {}

[storage]
; Root directory of the tile store; each layer lives in <directory>/<source_dir>
directory = {}

[compositor]
; Darken the night side of the globe
sun_shading = {}
; Show city lights instead of darkening the night side
city_lights = {}
; Paint each tile's address onto it (debugging)
tile_id = {}

[logging]
directory = {}
file = {}

; Texture layers are blended in the order they appear below.
; [layer.<name>]
; source_dir = earth/bluemarble   ; directory under the storage root
; format = png                    ; tile file extension
; tile_size = 256                 ; pixels, or WIDTHxHEIGHT
; level_zero_columns = 2
; level_zero_rows = 1
; projection = equirectangular    ; or mercator
; max_level = 6                   ; deepest level with tiles (optional)
; blending = CloudsBlending       ; omit to paint over the layers below
; bbox = -180,-90,180,90          ; west,south,east,north in degrees (optional)
; expire = 31536000               ; seconds before a stored tile is refreshed
"#,
        format_size(config.cache.volatile_size),
        path_to_string(&config.storage.directory),
        config.compositor.sun_shading,
        config.compositor.city_lights,
        config.compositor.tile_id,
        path_to_string(&config.logging.directory),
        config.logging.file,
    );

    for layer in &config.layers {
        out.push('\n');
        write_layer(&mut out, layer);
    }

    out
}

fn write_layer(out: &mut String, layer: &TextureLayer) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "[{}{}]", LAYER_SECTION_PREFIX, layer.name);
    let _ = writeln!(out, "source_dir = {}", layer.source_dir);
    let _ = writeln!(out, "format = {}", layer.file_format);
    let _ = writeln!(out, "tile_size = {}", layer.tile_size);
    let _ = writeln!(out, "level_zero_columns = {}", layer.geometry.level_zero_columns);
    let _ = writeln!(out, "level_zero_rows = {}", layer.geometry.level_zero_rows);
    let _ = writeln!(out, "projection = {}", layer.projection);
    if let Some(level) = layer.maximum_tile_level {
        let _ = writeln!(out, "max_level = {}", level);
    }
    if let Some(blending) = &layer.blending {
        let _ = writeln!(out, "blending = {}", blending);
    }
    if let Some(bbox) = &layer.lat_lon_box {
        let _ = writeln!(
            out,
            "bbox = {},{},{},{}",
            bbox.west.to_degrees(),
            bbox.south.to_degrees(),
            bbox.east.to_degrees(),
            bbox.north.to_degrees()
        );
    }
    let _ = writeln!(out, "expire = {}", layer.expire_secs);
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
