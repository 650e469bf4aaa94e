//! Two-tier cache of composited tiles.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::coord::TileId;
use crate::raster::Raster;
use crate::render_state::{RenderState, RenderStatus};
use crate::tile::StackedTile;

use super::builder::{StackedTileBuilder, TileCacheListener};
use super::evictable::{EvictableCache, Insertion};
use super::stats::{CacheStatistics, CacheStats};

/// Default budget of the evictable tier in bytes.
pub const DEFAULT_BYTE_BUDGET: usize = 20_000 * 1024;

struct CacheState {
    /// Tiles used by the current or last render pass
    on_display: HashMap<TileId, Arc<StackedTile>>,
    /// Tiles kept for reuse; never shares a key with `on_display`
    evictable: EvictableCache,
}

/// Cache of composited tiles shared by renderer threads.
///
/// Tiles on display are kept unconditionally. Tiles not used during a render
/// pass move to a byte-budgeted evictable tier from which they are either
/// promoted back or dropped oldest-first. A miss in both tiers builds the
/// tile through the [`StackedTileBuilder`] while holding the write lock, so
/// each address is built at most once at a time.
///
/// A render pass is expected to call [`reset_usage_marks`], then
/// [`load_tile`] for every visible tile, then [`evict_unused`].
///
/// [`reset_usage_marks`]: TileCache::reset_usage_marks
/// [`load_tile`]: TileCache::load_tile
/// [`evict_unused`]: TileCache::evict_unused
pub struct TileCache {
    builder: Arc<dyn StackedTileBuilder>,
    state: RwLock<CacheState>,
    stats: Mutex<CacheStats>,
    listener: Option<Arc<dyn TileCacheListener>>,
}

impl fmt::Debug for TileCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("TileCache")
            .field("on_display", &state.on_display.len())
            .field("evictable", &state.evictable.len())
            .field("byte_budget", &state.evictable.max_cost())
            .finish()
    }
}

impl TileCache {
    /// Creates an empty cache with the default byte budget.
    pub fn new(builder: Arc<dyn StackedTileBuilder>) -> Self {
        Self::with_byte_budget(builder, DEFAULT_BYTE_BUDGET)
    }

    pub fn with_byte_budget(builder: Arc<dyn StackedTileBuilder>, byte_budget: usize) -> Self {
        Self {
            builder,
            state: RwLock::new(CacheState {
                on_display: HashMap::new(),
                evictable: EvictableCache::new(byte_budget),
            }),
            stats: Mutex::new(CacheStats::new()),
            listener: None,
        }
    }

    /// Registers the receiver of `tile_loaded` and `cleared` notifications.
    pub fn with_listener(mut self, listener: Arc<dyn TileCacheListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Returns the composited tile for `id`, building it if needed.
    ///
    /// Any source id on `id` is ignored. The returned tile is marked used.
    pub fn load_tile(&self, id: &TileId) -> Arc<StackedTile> {
        let id = id.to_stacked();

        {
            let state = self.state.read();
            if let Some(tile) = state.on_display.get(&id) {
                tile.set_used(true);
                self.stats.lock().record_display_hit();
                return Arc::clone(tile);
            }
        }

        let mut state = self.state.write();

        // Another thread may have loaded it between the two locks
        if let Some(tile) = state.on_display.get(&id) {
            tile.set_used(true);
            self.stats.lock().record_display_hit();
            return Arc::clone(tile);
        }

        let tile = match state.evictable.take(&id) {
            Some(tile) => {
                debug!(tile = %id, "Promoted tile from evictable cache");
                self.stats.lock().record_evictable_hit();
                tile
            }
            None => {
                let tile = Arc::new(self.builder.build_tile(&id));
                debug!(tile = %id, bytes = tile.byte_count(), "Built stacked tile");
                self.stats.lock().record_build();
                tile
            }
        };

        tile.set_used(true);
        state.on_display.insert(id, Arc::clone(&tile));
        tile
    }

    /// Clears the used flag of every tile on display.
    pub fn reset_usage_marks(&self) {
        let state = self.state.read();
        for tile in state.on_display.values() {
            tile.set_used(false);
        }
    }

    /// Moves every tile on display that was not used since the last
    /// [`reset_usage_marks`](TileCache::reset_usage_marks) to the evictable tier.
    pub fn evict_unused(&self) {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let mut unused: Vec<TileId> = state
            .on_display
            .iter()
            .filter(|(_, tile)| !tile.used())
            .map(|(id, _)| id.clone())
            .collect();
        if unused.is_empty() {
            return;
        }
        // Address order keeps eviction deterministic across runs
        unused.sort();

        let mut stats = self.stats.lock();
        for id in unused {
            let Some(tile) = state.on_display.remove(&id) else {
                continue;
            };
            let cost = tile.byte_count();
            match state.evictable.insert(id, tile, cost) {
                Insertion::Stored { evicted } => stats.record_evictions(evicted as u64),
                Insertion::Oversized => {
                    debug!(bytes = cost, "Dropped tile larger than the cache budget");
                    stats.record_dropped_oversized();
                }
            }
        }
    }

    /// Applies a freshly downloaded raw tile.
    ///
    /// A composite on display is rebuilt with `image` in place of the old
    /// raw tile and listeners are told. A composite in the evictable tier is
    /// purged so the next load rebuilds it.
    pub fn update_tile(&self, raw_id: &TileId, image: Raster) {
        let id = raw_id.to_stacked();

        let rebuilt = {
            let mut state = self.state.write();
            match state.on_display.get(&id).cloned() {
                Some(old) => {
                    let tile = Arc::new(self.builder.rebuild_tile(&old, raw_id, image));
                    tile.set_used(old.used());
                    state.on_display.insert(id.clone(), tile);
                    self.stats.lock().record_rebuild();
                    true
                }
                None => {
                    if state.evictable.remove(&id) {
                        self.stats.lock().record_purge();
                    }
                    false
                }
            }
        };

        if rebuilt {
            debug!(tile = %id, raw = %raw_id, "Rebuilt tile with updated data");
            if let Some(listener) = &self.listener {
                listener.tile_loaded(&id);
            }
        }
    }

    /// Drops every tile from both tiers.
    pub fn clear(&self) {
        {
            let mut state = self.state.write();
            state.on_display.clear();
            state.evictable.clear();
        }
        info!("Cleared stacked tile cache");
        if let Some(listener) = &self.listener {
            listener.cleared();
        }
    }

    /// Sets the budget of the evictable tier, evicting at once if it shrank.
    pub fn set_byte_budget(&self, bytes: usize) {
        let evicted = self.state.write().evictable.set_max_cost(bytes);
        if evicted > 0 {
            self.stats.lock().record_evictions(evicted as u64);
        }
        info!(bytes, evicted, "Set tile cache budget");
    }

    pub fn byte_budget(&self) -> usize {
        self.state.read().evictable.max_cost()
    }

    /// Number of tiles held in both tiers.
    pub fn tile_count(&self) -> usize {
        let state = self.state.read();
        state.on_display.len() + state.evictable.len()
    }

    /// Addresses of the tiles on display, sorted.
    pub fn visible_tile_addresses(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = self.state.read().on_display.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Completeness of every tile on display.
    pub fn render_state(&self) -> RenderState {
        let mut root = RenderState::new("Stacked Tiles", RenderStatus::Complete);
        for id in self.visible_tile_addresses() {
            root.add_child(self.builder.render_state(&id));
        }
        root
    }

    /// Completeness of the tile at `id`, whether cached or not.
    pub fn render_state_of(&self, id: &TileId) -> RenderState {
        self.builder.render_state(&id.to_stacked())
    }

    /// Counters and current sizes.
    pub fn stats(&self) -> CacheStatistics {
        let state = self.state.read();
        let mut stats = self.stats.lock().clone();

        stats.display_entry_count = state.on_display.len();
        stats.display_size_bytes = state.on_display.values().map(|t| t.byte_count()).sum();
        stats.evictable_entry_count = state.evictable.len();
        stats.evictable_size_bytes = state.evictable.total_cost();
        stats.byte_budget = state.evictable.max_cost();

        CacheStatistics::from_stats(&stats)
    }
}
