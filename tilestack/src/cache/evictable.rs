//! Byte-budgeted store for tiles that are no longer on display.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::coord::TileId;
use crate::tile::StackedTile;

#[derive(Debug)]
struct Entry {
    tile: Arc<StackedTile>,
    cost: usize,
    seq: u64,
}

/// Result of [`EvictableCache::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Stored; `evicted` older entries were dropped to make room
    Stored { evicted: usize },
    /// Not stored because the cost exceeds the whole budget
    Oversized,
}

/// Tiles kept for possible reuse, dropped oldest-first when the total cost
/// exceeds the budget.
#[derive(Debug)]
pub struct EvictableCache {
    entries: HashMap<TileId, Entry>,
    /// Insertion sequence to address, oldest first
    order: BTreeMap<u64, TileId>,
    next_seq: u64,
    total_cost: usize,
    max_cost: usize,
}

impl EvictableCache {
    pub fn new(max_cost: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            total_cost: 0,
            max_cost,
        }
    }

    /// Stores `tile` at `cost`, replacing any entry for the same address.
    pub fn insert(&mut self, id: TileId, tile: Arc<StackedTile>, cost: usize) -> Insertion {
        self.remove(&id);
        if cost > self.max_cost {
            return Insertion::Oversized;
        }

        let evicted = self.evict_to(self.max_cost - cost);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id.clone());
        self.entries.insert(id, Entry { tile, cost, seq });
        self.total_cost += cost;

        Insertion::Stored { evicted }
    }

    /// Removes and returns the tile for `id`.
    pub fn take(&mut self, id: &TileId) -> Option<Arc<StackedTile>> {
        let entry = self.entries.remove(id)?;
        self.order.remove(&entry.seq);
        self.total_cost -= entry.cost;
        Some(entry.tile)
    }

    /// Drops the tile for `id`; returns whether there was one.
    pub fn remove(&mut self, id: &TileId) -> bool {
        self.take(id).is_some()
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_cost(&self) -> usize {
        self.total_cost
    }

    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    /// Changes the budget, dropping the oldest entries that no longer fit.
    ///
    /// Returns the number of entries dropped.
    pub fn set_max_cost(&mut self, max_cost: usize) -> usize {
        self.max_cost = max_cost;
        self.evict_to(max_cost)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_cost = 0;
    }

    /// Addresses from oldest to newest.
    pub fn addresses(&self) -> impl Iterator<Item = &TileId> {
        self.order.values()
    }

    fn evict_to(&mut self, limit: usize) -> usize {
        let mut evicted = 0;
        while self.total_cost > limit {
            let Some((_, id)) = self.order.pop_first() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&id) {
                self.total_cost -= entry.cost;
                evicted += 1;
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    fn tile(column: u32) -> (TileId, Arc<StackedTile>) {
        let id = TileId::stacked(4, column, 0);
        let tile = StackedTile::new(id.clone(), Raster::transparent(1, 1), Vec::new());
        (id, Arc::new(tile))
    }

    #[test]
    fn test_insert_and_take() {
        let mut cache = EvictableCache::new(100);
        let (id, t) = tile(0);

        assert_eq!(cache.insert(id.clone(), t, 40), Insertion::Stored { evicted: 0 });
        assert!(cache.contains(&id));
        assert_eq!(cache.total_cost(), 40);

        assert!(cache.take(&id).is_some());
        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
        assert!(cache.take(&id).is_none());
    }

    #[test]
    fn test_oldest_entries_are_dropped_first() {
        let mut cache = EvictableCache::new(100);
        for column in 0..3 {
            let (id, t) = tile(column);
            cache.insert(id, t, 40);
        }

        // third insert pushed out the first
        assert!(!cache.contains(&TileId::stacked(4, 0, 0)));
        assert!(cache.contains(&TileId::stacked(4, 1, 0)));
        assert!(cache.contains(&TileId::stacked(4, 2, 0)));
        assert_eq!(cache.total_cost(), 80);
    }

    #[test]
    fn test_oversized_is_rejected() {
        let mut cache = EvictableCache::new(100);
        let (small, t) = tile(0);
        cache.insert(small.clone(), t, 10);
        let (big, t) = tile(1);

        assert_eq!(cache.insert(big.clone(), t, 101), Insertion::Oversized);
        assert!(!cache.contains(&big));
        assert!(cache.contains(&small));
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut cache = EvictableCache::new(100);
        let (id, t) = tile(0);
        cache.insert(id.clone(), t.clone(), 30);
        cache.insert(id.clone(), t, 50);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_cost(), 50);
    }

    #[test]
    fn test_shrinking_budget_evicts() {
        let mut cache = EvictableCache::new(100);
        for column in 0..4 {
            let (id, t) = tile(column);
            cache.insert(id, t, 25);
        }

        assert_eq!(cache.set_max_cost(50), 2);
        let left: Vec<_> = cache.addresses().cloned().collect();
        assert_eq!(left, vec![TileId::stacked(4, 2, 0), TileId::stacked(4, 3, 0)]);
    }
}
