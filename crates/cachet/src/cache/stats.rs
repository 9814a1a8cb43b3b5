//! Cache usage statistics.
//!
//! Every lookup is counted as a hit or a miss; the counters reset on
//! `clear`. Collection uses atomics so reading statistics never contends
//! with the storage lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Snapshot of one instance's usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries currently stored (live or not yet lazily evicted).
    pub count: usize,

    /// Lookups that found a live entry since creation or the last clear.
    pub hits: u64,

    /// Lookups that found nothing since creation or the last clear.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, defined as 0.0 when there have been no
    /// lookups at all.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of lookups (hits + misses).
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Shared hit/miss counters behind a cache instance.
#[derive(Debug)]
pub(crate) struct MetricsCollector {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self { hits: Arc::clone(&self.hits), misses: Arc::clone(&self.misses) }
    }
}

impl MetricsCollector {
    pub(crate) fn new() -> Self {
        Self { hits: Arc::new(AtomicU64::new(0)), misses: Arc::new(AtomicU64::new(0)) }
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a statistics snapshot for the given entry count.
    pub(crate) fn snapshot(&self, count: usize) -> CacheStats {
        CacheStats {
            count,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Reset both counters to zero.
    pub(crate) fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::stats.
    use super::*;

    /// Validates `CacheStats::hit_rate` behavior for the rate calculation
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `hit_rate()` equals `0.25` for 1 hit and 3 misses.
    /// - Confirms `total_accesses()` equals `4`.
    #[test]
    fn test_hit_rate_calculation() {
        let stats = CacheStats { count: 1, hits: 1, misses: 3 };
        assert_eq!(stats.hit_rate(), 0.25);
        assert_eq!(stats.total_accesses(), 4);
    }

    /// Validates `CacheStats::hit_rate` behavior for the no accesses
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `hit_rate()` equals `0.0` rather than NaN.
    #[test]
    fn test_hit_rate_no_accesses() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.total_accesses(), 0);
    }

    /// Validates `MetricsCollector::new` behavior for the record and snapshot
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms recorded hits and misses appear in the snapshot.
    /// - Confirms the snapshot carries the supplied count.
    #[test]
    fn test_collector_records_and_snapshots() {
        let collector = MetricsCollector::new();
        collector.record_hit();
        collector.record_miss();
        collector.record_miss();

        let stats = collector.snapshot(7);
        assert_eq!(stats, CacheStats { count: 7, hits: 1, misses: 2 });
    }

    /// Validates `MetricsCollector::clone` behavior for the shared counters
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms clones observe each other's recordings.
    /// - Confirms `reset` zeroes both counters for all clones.
    #[test]
    fn test_collector_clones_share_counters() {
        let collector = MetricsCollector::new();
        let clone = collector.clone();

        collector.record_hit();
        clone.record_hit();
        assert_eq!(collector.snapshot(0).hits, 2);

        clone.reset();
        assert_eq!(collector.snapshot(0), CacheStats::default());
    }
}
