use std::collections::HashMap;

use parking_lot::Mutex;

use super::*;
use crate::coord::TileSize;
use crate::raster::color::{alpha, blue, green, red, rgb, rgba};
use crate::raster::PixelFormat;
use crate::sun::SunPosition;

/// In-memory tile source recording download requests.
#[derive(Default)]
struct MemorySource {
    tiles: HashMap<TileId, Raster>,
    statuses: HashMap<TileId, TileStatus>,
    downloads: Mutex<Vec<(TileId, DownloadUsage)>>,
}

impl MemorySource {
    fn with_tile(mut self, id: TileId, image: Raster) -> Self {
        self.statuses.insert(id.clone(), TileStatus::Available);
        self.tiles.insert(id, image);
        self
    }

    fn with_status(mut self, id: TileId, status: TileStatus) -> Self {
        self.statuses.insert(id, status);
        self
    }
}

impl TileSource for MemorySource {
    fn load_tile_image(&self, layer: &TextureLayer, id: &TileId, _usage: DownloadUsage) -> Raster {
        self.tiles
            .get(id)
            .cloned()
            .unwrap_or_else(|| Raster::transparent(layer.tile_size.width, layer.tile_size.height))
    }

    fn download_tile(&self, _layer: &TextureLayer, id: &TileId, usage: DownloadUsage) {
        self.downloads.lock().push((id.clone(), usage));
    }

    fn tile_status(&self, _layer: &TextureLayer, id: &TileId) -> TileStatus {
        self.statuses.get(id).copied().unwrap_or(TileStatus::Missing)
    }
}

const SIZE: u32 = 16;

fn layer(name: &str) -> TextureLayer {
    TextureLayer::new(name, name).with_tile_size(TileSize::square(SIZE))
}

fn filled(color: u32) -> Raster {
    Raster::filled(SIZE, SIZE, PixelFormat::Argb32, color)
}

fn compositor(source: MemorySource, layers: Vec<TextureLayer>) -> (LayerCompositor, Arc<MemorySource>) {
    let source = Arc::new(source);
    let compositor = LayerCompositor::new(source.clone(), Arc::new(SunLocator::default()));
    compositor.set_texture_layers(layers);
    (compositor, source)
}

#[test]
fn test_overpaint_over_opaque_base() {
    let source = MemorySource::default()
        .with_tile(TileId::new("earth", 1, 0, 0), filled(rgb(0, 0, 255)))
        .with_tile(TileId::new("roads", 1, 0, 0), filled(rgba(255, 0, 0, 128)));
    let (compositor, _) = compositor(
        source,
        vec![layer("earth"), layer("roads").with_blending("OverpaintBlending")],
    );

    let tile = compositor.load_tile(&TileId::stacked(1, 0, 0));

    assert_eq!(tile.id(), &TileId::stacked(1, 0, 0));
    assert_eq!(tile.tiles().len(), 2);
    assert_eq!(tile.image().format(), PixelFormat::Argb32Premultiplied);
    let p = tile.pixel(8, 8);
    assert_eq!((red(p), green(p), blue(p), alpha(p)), (128, 0, 127, 255));
}

#[test]
fn test_blend_order_follows_configuration() {
    let source = MemorySource::default()
        .with_tile(TileId::new("a", 0, 0, 0), filled(rgb(200, 200, 200)))
        .with_tile(TileId::new("b", 0, 0, 0), filled(rgb(10, 20, 30)));
    let (compositor, _) = compositor(source, vec![layer("a"), layer("b")]);

    // the later layer has no blending and replaces the earlier one
    let tile = compositor.load_tile(&TileId::stacked(0, 0, 0));
    assert_eq!(tile.pixel(0, 0), rgb(10, 20, 30));
}

#[test]
fn test_single_layer_keeps_its_format() {
    let gray = Raster::filled(SIZE, SIZE, PixelFormat::Grayscale8, 0);
    let source = MemorySource::default().with_tile(TileId::new("relief", 0, 1, 0), gray);
    let (compositor, _) = compositor(source, vec![layer("relief")]);

    let tile = compositor.load_tile(&TileId::stacked(0, 1, 0));
    assert_eq!(tile.image().format(), PixelFormat::Grayscale8);
}

#[test]
fn test_no_relevant_layer_gives_transparent_placeholder() {
    let (compositor, _) = compositor(
        MemorySource::default(),
        vec![layer("earth").with_maximum_tile_level(2)],
    );

    let tile = compositor.load_tile(&TileId::stacked(3, 0, 0));

    assert!(tile.tiles().is_empty());
    assert_eq!((tile.image().width(), tile.image().height()), (SIZE, SIZE));
    assert_eq!(alpha(tile.pixel(4, 4)), 0);
    assert_eq!(
        compositor.render_state(&TileId::stacked(3, 0, 0)).status(),
        RenderStatus::Incomplete
    );
}

#[test]
fn test_layer_outside_its_box_is_skipped() {
    // level 0 of a 2x1 grid: column 0 is the western hemisphere
    let east_only = layer("east").with_lat_lon_box(LatLonBox::from_degrees(50.0, 10.0, 40.0, 10.0));
    let (compositor, _) = compositor(MemorySource::default(), vec![layer("earth"), east_only]);

    let west = compositor.load_tile(&TileId::stacked(0, 0, 0));
    let east = compositor.load_tile(&TileId::stacked(0, 1, 0));

    assert_eq!(west.tiles().len(), 1);
    assert_eq!(east.tiles().len(), 2);
}

#[test]
fn test_blended_top_is_rescaled() {
    let small = Raster::filled(4, 4, PixelFormat::Argb32, rgb(255, 255, 255));
    let source = MemorySource::default()
        .with_tile(TileId::new("earth", 0, 0, 0), filled(rgb(0, 0, 0)))
        .with_tile(TileId::new("clouds", 0, 0, 0), small);
    let (compositor, _) = compositor(
        source,
        vec![layer("earth"), layer("clouds").with_blending("CloudsBlending")],
    );

    let tile = compositor.load_tile(&TileId::stacked(0, 0, 0));
    assert_eq!(tile.image().width(), SIZE);
    assert_eq!(tile.pixel(SIZE - 1, SIZE - 1), rgb(255, 255, 255));
}

#[test]
fn test_update_tile_keeps_blending() {
    let source = MemorySource::default()
        .with_tile(TileId::new("earth", 0, 0, 0), filled(rgb(0, 0, 255)))
        .with_tile(TileId::new("roads", 0, 0, 0), filled(rgba(0, 0, 0, 0)));
    let (compositor, _) = compositor(
        source,
        vec![layer("earth"), layer("roads").with_blending("OverpaintBlending")],
    );
    let tile = compositor.load_tile(&TileId::stacked(0, 0, 0));
    assert_eq!(tile.pixel(0, 0), rgb(0, 0, 255));

    let updated = compositor.update_tile(&tile, &TileId::new("roads", 0, 0, 0), filled(rgb(0, 255, 0)));

    assert_eq!(updated.pixel(0, 0), rgb(0, 255, 0));
    assert_eq!(
        updated.tiles()[1].blending().map(|b| b.name()),
        Some("OverpaintBlending")
    );
    assert!(Arc::ptr_eq(&tile.tiles()[0], &updated.tiles()[0]));
}

#[test]
fn test_render_state_maps_tile_status() {
    let source = MemorySource::default()
        .with_status(TileId::new("a", 1, 0, 0), TileStatus::Available)
        .with_status(TileId::new("b", 1, 0, 0), TileStatus::Expired);
    let (compositor, _) = compositor(source, vec![layer("a"), layer("b"), layer("c")]);

    let state = compositor.render_state(&TileId::stacked(1, 0, 0));
    let statuses: Vec<RenderStatus> = state.children().iter().map(|c| c.status()).collect();

    assert_eq!(
        statuses,
        vec![
            RenderStatus::Complete,
            RenderStatus::WaitingForUpdate,
            RenderStatus::WaitingForData
        ]
    );
    assert_eq!(state.status(), RenderStatus::WaitingForData);
}

#[test]
fn test_render_state_outside_grid_is_incomplete() {
    let (compositor, _) = compositor(MemorySource::default(), vec![layer("a")]);

    let state = compositor.render_state(&TileId::stacked(0, 7, 0));
    assert_eq!(state.children()[0].status(), RenderStatus::Incomplete);
}

#[test]
fn test_download_stacked_tile() {
    let source = MemorySource::default().with_status(TileId::new("a", 2, 1, 1), TileStatus::Available);
    let (compositor, source) = compositor(source, vec![layer("a"), layer("b")]);
    let id = TileId::stacked(2, 1, 1);

    compositor.download_stacked_tile(&id, DownloadUsage::Bulk);
    assert_eq!(
        *source.downloads.lock(),
        vec![(TileId::new("b", 2, 1, 1), DownloadUsage::Bulk)]
    );

    source.downloads.lock().clear();
    compositor.download_stacked_tile(&id, DownloadUsage::Browse);
    assert_eq!(source.downloads.lock().len(), 2);
}

#[test]
fn test_sun_shading_darkens_night_side() {
    let source = MemorySource::default()
        .with_tile(TileId::new("earth", 0, 0, 0), filled(rgb(200, 200, 200)))
        .with_tile(TileId::new("earth", 0, 1, 0), filled(rgb(200, 200, 200)));
    let source = Arc::new(source);
    // sun over 90°E: the western hemisphere is dark
    let sun = Arc::new(SunLocator::new(SunPosition::new(std::f64::consts::FRAC_PI_2, 0.0)));
    let compositor = LayerCompositor::new(source, sun);
    compositor.set_texture_layers(vec![layer("earth")]);
    compositor.set_show_sun_shading(true);

    let night = compositor.load_tile(&TileId::stacked(0, 0, 0));
    let day = compositor.load_tile(&TileId::stacked(0, 1, 0));

    assert_eq!(night.pixel(8, 8), rgb(70, 70, 70));
    assert_eq!(day.pixel(8, 8), rgb(200, 200, 200));

    // city lights take over the night side
    compositor.set_show_city_lights(true);
    let unshaded = compositor.load_tile(&TileId::stacked(0, 0, 0));
    assert_eq!(unshaded.pixel(8, 8), rgb(200, 200, 200));
}

#[test]
fn test_tile_id_overlay() {
    let image = Raster::filled(256, 256, PixelFormat::Argb32, rgb(128, 128, 128));
    let source = MemorySource::default().with_tile(TileId::new("earth", 0, 0, 0), image);
    let (compositor, _) = compositor(source, vec![layer("earth")]);
    compositor.set_show_tile_id(true);

    let tile = compositor.load_tile(&TileId::stacked(0, 0, 0));
    assert_eq!(tile.pixel(2, 128), rgb(255, 255, 255));
    assert_eq!(tile.pixel(128, 240), rgb(128, 128, 128));
}

#[test]
fn test_ground_overlay_is_painted() {
    let source = MemorySource::default()
        .with_tile(TileId::new("earth", 0, 1, 0), filled(rgb(0, 0, 255)));
    let (compositor, _) = compositor(source, vec![layer("earth")]);
    let overlay = GroundOverlay::new(
        Raster::filled(8, 8, PixelFormat::Argb32, rgb(255, 0, 0)),
        LatLonBox::from_degrees(90.0, -90.0, 180.0, 0.0),
    );
    compositor.set_ground_overlays(vec![overlay]);

    let tile = compositor.load_tile(&TileId::stacked(0, 1, 0));
    assert_eq!(tile.pixel(8, 8), rgb(255, 0, 0));
}

#[test]
fn test_grid_queries() {
    let (compositor, _) = compositor(
        MemorySource::default(),
        vec![layer("earth")
            .with_geometry(LevelGeometry::new(1, 1))
            .with_projection(TileProjection::Mercator)
            .with_maximum_tile_level(6)],
    );

    assert_eq!(compositor.tile_column_count(3), 8);
    assert_eq!(compositor.tile_row_count(3), 8);
    assert_eq!(compositor.tile_projection(), TileProjection::Mercator);
    assert_eq!(compositor.tile_size(), TileSize::square(SIZE));
    assert_eq!(compositor.maximum_tile_level(), Some(6));
    assert_eq!(compositor.texture_layer_count(), 1);

    let (empty, _) = compositor_without_layers();
    assert_eq!(empty.maximum_tile_level(), None);
}

fn compositor_without_layers() -> (LayerCompositor, Arc<MemorySource>) {
    compositor(MemorySource::default(), Vec::new())
}
