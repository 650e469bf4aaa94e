//! Tile cache statistics tracking and reporting.

use std::time::Instant;

/// Counters kept by the tile cache.
#[derive(Debug, Clone)]
pub struct CacheStats {
    // Lookups
    pub display_hits: u64,
    pub evictable_hits: u64,
    pub builds: u64,

    // Updates
    pub rebuilds: u64,
    pub purges: u64,

    // Eviction
    pub evictions: u64,
    pub dropped_oversized: u64,

    // Current size
    pub display_entry_count: usize,
    pub display_size_bytes: usize,
    pub evictable_entry_count: usize,
    pub evictable_size_bytes: usize,
    pub byte_budget: usize,

    // Timing
    pub created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            display_hits: 0,
            evictable_hits: 0,
            builds: 0,
            rebuilds: 0,
            purges: 0,
            evictions: 0,
            dropped_oversized: 0,
            display_entry_count: 0,
            display_size_bytes: 0,
            evictable_entry_count: 0,
            evictable_size_bytes: 0,
            byte_budget: 0,
            created_at: Instant::now(),
        }
    }

    /// Total number of `load_tile` calls.
    pub fn lookups(&self) -> u64 {
        self.display_hits + self.evictable_hits + self.builds
    }

    /// Share of lookups served without building (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            (self.display_hits + self.evictable_hits) as f64 / total as f64
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub fn record_display_hit(&mut self) {
        self.display_hits += 1;
    }

    /// A tile was promoted from the evictable store back on display.
    pub fn record_evictable_hit(&mut self) {
        self.evictable_hits += 1;
    }

    pub fn record_build(&mut self) {
        self.builds += 1;
    }

    pub fn record_rebuild(&mut self) {
        self.rebuilds += 1;
    }

    pub fn record_purge(&mut self) {
        self.purges += 1;
    }

    pub fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }

    /// A tile bigger than the whole budget was not kept.
    pub fn record_dropped_oversized(&mut self) {
        self.dropped_oversized += 1;
    }
}

/// Snapshot of cache statistics for reporting.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub stats: CacheStats,
    pub hit_rate_percent: f64,
    pub uptime_secs: u64,
}

impl CacheStatistics {
    pub fn from_stats(stats: &CacheStats) -> Self {
        Self {
            stats: stats.clone(),
            hit_rate_percent: stats.hit_rate() * 100.0,
            uptime_secs: stats.uptime().as_secs(),
        }
    }

    /// Human-readable report.
    pub fn format(&self) -> String {
        let stats = &self.stats;
        let mb = |bytes: usize| bytes as f64 / (1024.0 * 1024.0);

        format!(
            r#"Stacked Tile Cache Statistics

ON DISPLAY
  Entries:     {}
  Size:        {:.2} MB
  Hits:        {}

EVICTABLE
  Entries:     {}
  Size:        {:.2} MB
  Budget:      {:.2} MB
  Promotions:  {}
  Evictions:   {}
  Oversized:   {}

BUILDS
  Built:       {}
  Rebuilt:     {}
  Purged:      {}

OVERALL
  Hit Rate:    {:.1}%
  Uptime:      {}s
"#,
            stats.display_entry_count,
            mb(stats.display_size_bytes),
            stats.display_hits,
            stats.evictable_entry_count,
            mb(stats.evictable_size_bytes),
            mb(stats.byte_budget),
            stats.evictable_hits,
            stats.evictions,
            stats.dropped_oversized,
            stats.builds,
            stats.rebuilds,
            stats.purges,
            self.hit_rate_percent,
            self.uptime_secs,
        )
    }
}
