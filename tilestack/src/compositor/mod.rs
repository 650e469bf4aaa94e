//! Merges texture layers into composited tiles.
//!
//! For a composited address the compositor picks the layers that have data
//! for the cell, loads each layer's tile from the [`TileSource`], blends them
//! in configuration order and finishes the image with ground overlays, sun
//! shading and the optional tile-id overlay.

mod tile_id;

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::blend::BlendContext;
use crate::cache::StackedTileBuilder;
use crate::coord::{LatLonBox, LevelGeometry, TileId, TileProjection, TileSize};
use crate::layer::{GroundOverlay, TextureLayer};
use crate::raster::Raster;
use crate::render_state::{RenderState, RenderStatus};
use crate::source::{DownloadUsage, TileSource, TileStatus};
use crate::sun::{max_divisor, SunLocator, SunShading, MAX_INTERPOLATION_STEP};
use crate::tile::{StackedTile, TextureTile};

/// Reconfigurable part of the compositor.
///
/// Builds work on a shared snapshot, so reconfiguring never waits for a
/// running build and a build never sees a half-applied change.
#[derive(Debug, Clone, Default)]
struct Settings {
    layers: Vec<TextureLayer>,
    overlays: Arc<Vec<GroundOverlay>>,
    show_sun_shading: bool,
    show_city_lights: bool,
    show_tile_id: bool,
    theme_id: String,
    maximum_tile_level: Option<u32>,
}

impl Settings {
    fn first_layer(&self) -> Option<&TextureLayer> {
        self.layers.first()
    }

    fn geometry(&self) -> LevelGeometry {
        self.first_layer().map(|l| l.geometry).unwrap_or_default()
    }

    fn projection(&self) -> TileProjection {
        self.first_layer().map(|l| l.projection).unwrap_or_default()
    }

    fn tile_size(&self) -> TileSize {
        self.first_layer().map(|l| l.tile_size).unwrap_or_default()
    }

    fn footprint(&self, id: &TileId) -> LatLonBox {
        self.projection().tile_lat_lon_box(id, &self.geometry())
    }

    /// Layers with data for the cell of `id`, in blend order.
    fn relevant_layers(&self, id: &TileId) -> Vec<&TextureLayer> {
        let footprint = self.footprint(id);
        self.layers
            .iter()
            .filter(|layer| layer.provides_level(id.level) && layer.covers(&footprint))
            .collect()
    }
}

/// Builds [`StackedTile`]s from the configured texture layers.
pub struct LayerCompositor {
    source: Arc<dyn TileSource>,
    sun: Arc<SunLocator>,
    settings: RwLock<Arc<Settings>>,
}

impl std::fmt::Debug for LayerCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerCompositor")
            .field("settings", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl LayerCompositor {
    pub fn new(source: Arc<dyn TileSource>, sun: Arc<SunLocator>) -> Self {
        Self {
            source,
            sun,
            settings: RwLock::new(Arc::new(Settings::default())),
        }
    }

    fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&self.settings.read())
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.settings.write();
        let mut next = Settings::clone(&guard);
        apply(&mut next);
        *guard = Arc::new(next);
    }

    /// Replaces the layer stack. The first layer defines the grid, the
    /// projection and the tile size of the composited tiles.
    pub fn set_texture_layers(&self, layers: Vec<TextureLayer>) {
        let maximum_tile_level = layers
            .first()
            .and_then(|first| self.source.maximum_tile_level(first));
        info!(
            layers = layers.len(),
            maximum_tile_level = ?maximum_tile_level,
            "texture layers configured"
        );
        self.update(|settings| {
            if let Some(first) = layers.first() {
                settings.theme_id = first.theme_id();
            }
            settings.maximum_tile_level = maximum_tile_level;
            settings.layers = layers;
        });
    }

    pub fn set_ground_overlays(&self, overlays: Vec<GroundOverlay>) {
        debug!(overlays = overlays.len(), "ground overlays updated");
        self.update(|settings| settings.overlays = Arc::new(overlays));
    }

    pub fn set_show_sun_shading(&self, show: bool) {
        self.update(|settings| settings.show_sun_shading = show);
    }

    pub fn show_sun_shading(&self) -> bool {
        self.settings.read().show_sun_shading
    }

    /// City lights replace the plain sun shading with a night layer.
    pub fn set_show_city_lights(&self, show: bool) {
        self.update(|settings| settings.show_city_lights = show);
    }

    pub fn show_city_lights(&self) -> bool {
        self.settings.read().show_city_lights
    }

    pub fn set_show_tile_id(&self, show: bool) {
        self.update(|settings| settings.show_tile_id = show);
    }

    pub fn show_tile_id(&self) -> bool {
        self.settings.read().show_tile_id
    }

    pub fn texture_layer_count(&self) -> usize {
        self.settings.read().layers.len()
    }

    /// Deepest level of the first layer; `None` without layers.
    pub fn maximum_tile_level(&self) -> Option<u32> {
        self.settings.read().maximum_tile_level
    }

    pub fn tile_column_count(&self, level: u32) -> u32 {
        self.settings.read().geometry().columns_at(level)
    }

    pub fn tile_row_count(&self, level: u32) -> u32 {
        self.settings.read().geometry().rows_at(level)
    }

    pub fn tile_projection(&self) -> TileProjection {
        self.settings.read().projection()
    }

    pub fn tile_size(&self) -> TileSize {
        self.settings.read().tile_size()
    }

    /// Composites the tile at the stacked address `id`.
    pub fn load_tile(&self, id: &TileId) -> StackedTile {
        let settings = self.snapshot();
        let id = id.to_stacked();

        let tiles: Vec<Arc<TextureTile>> = settings
            .relevant_layers(&id)
            .into_iter()
            .map(|layer| {
                let raw_id = layer.raw_tile_id(&id);
                debug!(tile = %raw_id, format = %layer.file_format, "loading layer tile");
                let image = self
                    .source
                    .load_tile_image(layer, &raw_id, DownloadUsage::Browse);
                Arc::new(TextureTile::new(raw_id, image, layer.blending_mode()))
            })
            .collect();

        self.create_tile(&settings, id, tiles)
    }

    /// Re-composites `tile` with the layer tile `raw_id` replaced by `image`.
    ///
    /// The replaced tile keeps its blending.
    pub fn update_tile(&self, tile: &StackedTile, raw_id: &TileId, image: Raster) -> StackedTile {
        let maximum_tile_level = self
            .snapshot()
            .first_layer()
            .and_then(|first| self.source.maximum_tile_level(first));
        self.update(|settings| settings.maximum_tile_level = maximum_tile_level);
        let settings = self.snapshot();

        let tiles = tile
            .tiles()
            .iter()
            .map(|texture| {
                if texture.id() == raw_id {
                    Arc::new(TextureTile::new(
                        raw_id.clone(),
                        image.clone(),
                        texture.blending().copied(),
                    ))
                } else {
                    Arc::clone(texture)
                }
            })
            .collect();

        self.create_tile(&settings, tile.id().clone(), tiles)
    }

    /// Freshness of every layer tile contributing to `id`.
    pub fn render_state(&self, id: &TileId) -> RenderState {
        let settings = self.snapshot();
        let id = id.to_stacked();
        let layers = settings.relevant_layers(&id);

        let status = if layers.is_empty() {
            RenderStatus::Incomplete
        } else {
            RenderStatus::Complete
        };
        let name = format!("Tile {}/{}/{}", id.level, id.column, id.row);
        let mut state = RenderState::new(name, status);

        for layer in layers {
            let raw_id = layer.raw_tile_id(&id);
            let status = if !layer.geometry.contains(&raw_id) {
                RenderStatus::Incomplete
            } else {
                match self.source.tile_status(layer, &raw_id) {
                    TileStatus::Available => RenderStatus::Complete,
                    TileStatus::Expired => RenderStatus::WaitingForUpdate,
                    TileStatus::Missing => RenderStatus::WaitingForData,
                }
            };
            state.add_child(RenderState::new(layer.name.as_str(), status));
        }
        state
    }

    /// Requests downloads for the layer tiles of `id`.
    ///
    /// Browsing refreshes every layer; other usages only fetch tiles that
    /// are not available.
    pub fn download_stacked_tile(&self, id: &TileId, usage: DownloadUsage) {
        let settings = self.snapshot();
        let id = id.to_stacked();
        for layer in settings.relevant_layers(&id) {
            let raw_id = layer.raw_tile_id(&id);
            if usage == DownloadUsage::Browse
                || self.source.tile_status(layer, &raw_id) != TileStatus::Available
            {
                self.source.download_tile(layer, &raw_id, usage);
            }
        }
    }

    fn create_tile(
        &self,
        settings: &Settings,
        id: TileId,
        tiles: Vec<Arc<TextureTile>>,
    ) -> StackedTile {
        if tiles.is_empty() {
            let size = settings.tile_size();
            debug!(tile = %id, "no relevant layer, using a transparent tile");
            return StackedTile::new(id, Raster::transparent(size.width, size.height), tiles);
        }

        let with_conversion = tiles.len() > 1
            || settings.show_sun_shading
            || settings.show_tile_id
            || !settings.overlays.is_empty();
        let ctx = BlendContext {
            tile: id.clone(),
            geometry: settings.geometry(),
            projection: settings.projection(),
            sun: self.sun.snapshot(),
        };

        let mut result: Option<Raster> = None;
        for tile in &tiles {
            match tile.blending() {
                Some(blending) => {
                    let image = tile.image();
                    let bottom = result
                        .get_or_insert_with(|| Raster::transparent(image.width(), image.height()));
                    let same_size =
                        image.width() == bottom.width() && image.height() == bottom.height();
                    let top = if same_size {
                        Cow::Borrowed(image)
                    } else {
                        Cow::Owned(image.scaled(bottom.width(), bottom.height()))
                    };
                    debug!(tile = %tile.id(), blending = blending.name(), "blending");
                    blending.blend(bottom, &top, &ctx);
                }
                None => {
                    result = Some(if with_conversion {
                        tile.image().to_premultiplied()
                    } else {
                        tile.image().clone()
                    });
                }
            }
        }

        let mut image = match result {
            Some(image) => image,
            None => {
                let size = settings.tile_size();
                Raster::transparent(size.width, size.height)
            }
        };

        if !settings.overlays.is_empty() {
            let footprint = settings.footprint(&id);
            for overlay in settings.overlays.iter().filter(|o| o.touches(&footprint)) {
                overlay.render(&mut image, &footprint, ctx.projection);
            }
        }

        if settings.show_sun_shading && !settings.show_city_lights {
            paint_sun_shading(&mut image, &ctx);
        }

        if settings.show_tile_id {
            tile_id::paint_tile_id(&mut image, &id, &settings.theme_id);
        }

        StackedTile::new(id, image, tiles)
    }
}

impl StackedTileBuilder for LayerCompositor {
    fn build_tile(&self, id: &TileId) -> StackedTile {
        self.load_tile(id)
    }

    fn rebuild_tile(&self, tile: &StackedTile, raw_id: &TileId, image: Raster) -> StackedTile {
        self.update_tile(tile, raw_id, image)
    }

    fn render_state(&self, id: &TileId) -> RenderState {
        LayerCompositor::render_state(self, id)
    }
}

/// Darkens the night side of a 32-bit tile image.
fn paint_sun_shading(image: &mut Raster, ctx: &BlendContext) {
    if image.depth() != 32 {
        return;
    }
    let shading: SunShading = ctx.sun;
    let tile_width = image.width();
    let tile_height = image.height();
    let global_width = f64::from(tile_width) * f64::from(ctx.geometry.columns_at(ctx.tile.level));
    let global_height = f64::from(tile_height) * f64::from(ctx.geometry.rows_at(ctx.tile.level));
    if global_width == 0.0 || global_height == 0.0 {
        return;
    }

    let step = max_divisor(MAX_INTERPOLATION_STEP, tile_width);
    let origin_x = f64::from(ctx.tile.column) * f64::from(tile_width);
    let origin_y = f64::from(ctx.tile.row) * f64::from(tile_height);
    let lon_at = |x: u32| ctx.projection.lon_at((origin_x + f64::from(x)) / global_width);

    for y in 0..tile_height {
        let lat = ctx.projection.row_to_lat(origin_y + f64::from(y), global_height);
        let terms = shading.row_terms(lat);
        let Some(row) = image.row_mut(y) else {
            continue;
        };
        shading.shade_scanline(tile_width, step, terms, lon_at, |x, shade| {
            SunShading::shade_pixel(&mut row[x], shade);
        });
    }
}

#[cfg(test)]
mod tests;
