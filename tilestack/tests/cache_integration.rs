//! Integration tests for the tile cache under concurrent render passes.
//!
//! The builder here counts how often each address is composited so the
//! tests can check that concurrent loads never build a tile twice and that
//! the evictable tier promotes tiles instead of rebuilding them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tilestack::cache::{StackedTileBuilder, TileCache};
use tilestack::coord::TileId;
use tilestack::raster::color::rgb;
use tilestack::raster::{PixelFormat, Raster};
use tilestack::render_state::{RenderState, RenderStatus};
use tilestack::tile::StackedTile;

/// 8×8 ARGB tiles, 256 bytes each.
const TILE_BYTES: usize = 8 * 8 * 4;

#[derive(Default)]
struct CountingBuilder {
    builds: Mutex<HashMap<TileId, usize>>,
    total: AtomicUsize,
}

impl CountingBuilder {
    fn builds_of(&self, id: &TileId) -> usize {
        self.builds.lock().get(id).copied().unwrap_or(0)
    }
}

impl StackedTileBuilder for CountingBuilder {
    fn build_tile(&self, id: &TileId) -> StackedTile {
        *self.builds.lock().entry(id.clone()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);
        // Slow enough that racing threads overlap on the same address
        thread::sleep(std::time::Duration::from_millis(2));
        let shade = (id.column * 16 + id.row) as u8;
        let image = Raster::filled(8, 8, PixelFormat::Argb32Premultiplied, rgb(shade, 0, 0));
        StackedTile::new(id.clone(), image, Vec::new())
    }

    fn rebuild_tile(&self, tile: &StackedTile, _raw_id: &TileId, image: Raster) -> StackedTile {
        StackedTile::new(tile.id().clone(), image, Vec::new())
    }

    fn render_state(&self, _id: &TileId) -> RenderState {
        RenderState::new("layers", RenderStatus::Complete)
    }
}

fn visible(level: u32, columns: std::ops::Range<u32>, rows: std::ops::Range<u32>) -> Vec<TileId> {
    columns
        .flat_map(|column| rows.clone().map(move |row| TileId::stacked(level, column, row)))
        .collect()
}

/// One render pass: reset, load every visible tile, evict the rest.
fn render_pass(cache: &TileCache, tiles: &[TileId]) {
    cache.reset_usage_marks();
    for id in tiles {
        cache.load_tile(id);
    }
    cache.evict_unused();
}

#[test]
fn test_concurrent_loads_build_each_tile_once() {
    let builder = Arc::new(CountingBuilder::default());
    let cache = Arc::new(TileCache::new(builder.clone()));
    let tiles = visible(3, 0..4, 0..4);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            let mut tiles = tiles.clone();
            tiles.rotate_left(worker * 2);
            thread::spawn(move || {
                for id in &tiles {
                    let tile = cache.load_tile(id);
                    assert_eq!(tile.id(), id);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for id in &tiles {
        assert_eq!(builder.builds_of(id), 1, "{} built more than once", id);
    }
    assert_eq!(cache.tile_count(), tiles.len());

    let stats = cache.stats().stats;
    assert_eq!(stats.builds, tiles.len() as u64);
    assert_eq!(stats.lookups(), 8 * tiles.len() as u64);
}

#[test]
fn test_concurrent_loads_return_shared_tile() {
    let builder = Arc::new(CountingBuilder::default());
    let cache = Arc::new(TileCache::new(builder));
    let id = TileId::stacked(5, 7, 9);

    let tiles: Vec<_> = (0..6)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let id = id.clone();
            thread::spawn(move || cache.load_tile(&id))
        })
        .map(|handle| handle.join().unwrap())
        .collect();

    for tile in &tiles[1..] {
        assert!(Arc::ptr_eq(&tiles[0], tile));
    }
}

#[test]
fn test_panning_promotes_from_evictable_tier() {
    let builder = Arc::new(CountingBuilder::default());
    let cache = TileCache::new(builder.clone());

    let first = visible(4, 0..3, 0..2);
    let panned = visible(4, 1..4, 0..2);

    render_pass(&cache, &first);
    render_pass(&cache, &panned);
    assert_eq!(cache.visible_tile_addresses(), {
        let mut sorted = panned.clone();
        sorted.sort();
        sorted
    });

    // Panning back reuses column 0 from the evictable tier
    render_pass(&cache, &first);

    assert_eq!(builder.total.load(Ordering::SeqCst), 8);
    let stats = cache.stats().stats;
    assert_eq!(stats.evictable_hits, 2);
    assert_eq!(stats.evictable_entry_count, 2);
    assert_eq!(stats.evictable_size_bytes, 2 * TILE_BYTES);
}

#[test]
fn test_small_budget_forces_rebuild() {
    let builder = Arc::new(CountingBuilder::default());
    let cache = TileCache::with_byte_budget(builder.clone(), TILE_BYTES);

    let a = TileId::stacked(2, 0, 0);
    let b = TileId::stacked(2, 1, 0);
    let c = TileId::stacked(2, 2, 0);

    render_pass(&cache, &[a.clone(), b.clone()]);
    // a and b leave the display; only one fits the budget
    render_pass(&cache, &[c]);
    render_pass(&cache, &[a.clone(), b.clone()]);

    assert_eq!(builder.builds_of(&a), 2);
    assert_eq!(builder.builds_of(&b), 1);
    assert!(cache.stats().stats.evictions >= 1);
}

#[test]
fn test_render_passes_from_parallel_views() {
    let builder = Arc::new(CountingBuilder::default());
    let cache = Arc::new(TileCache::new(builder.clone()));

    let handles: Vec<_> = (0..4u32)
        .map(|view| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let tiles = visible(6, view..view + 3, 0..3);
                for _ in 0..5 {
                    for id in &tiles {
                        cache.load_tile(id);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // columns 0..6, rows 0..3
    assert_eq!(builder.total.load(Ordering::SeqCst), 18);
    assert_eq!(cache.tile_count(), 18);
    assert_eq!(cache.render_state().status(), RenderStatus::Complete);
}
