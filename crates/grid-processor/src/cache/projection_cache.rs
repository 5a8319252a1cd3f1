//! LRU memo of projected points.

use lru::LruCache;
use projection::Projection;
use std::num::NonZeroUsize;

use crate::types::{CacheStats, Point};

/// Cache key: the bit patterns of `(lon, lat)`.
///
/// Keys are exact; `0.0` and `-0.0` are distinct entries.
pub type PointKey = (u64, u64);

/// Memoizes `(lon, lat) -> [x, y]` for a single projection.
///
/// Failed projections are cached too, so a singular point is only tried once.
/// Entries are only meaningful for the projection they were computed with;
/// discard the cache when the projection changes.
pub struct ProjectionCache {
    cache: LruCache<PointKey, Option<Point>>,
    hits: u64,
    misses: u64,
}

impl ProjectionCache {
    /// Create a cache holding at most `capacity` points.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            misses: 0,
        }
    }

    pub fn key(lon: f64, lat: f64) -> PointKey {
        (lon.to_bits(), lat.to_bits())
    }

    /// Project through the cache.
    pub fn project(&mut self, projection: &dyn Projection, lon: f64, lat: f64) -> Option<Point> {
        let key = Self::key(lon, lat);
        if let Some(point) = self.cache.get(&key) {
            self.hits += 1;
            return *point;
        }
        self.misses += 1;
        let point = projection.project(lon, lat).map(|(x, y)| [x, y]);
        self.cache.put(key, point);
        point
    }

    /// Check if a key exists in the cache without updating LRU order.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.cache.contains(&Self::key(lon, lat))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for ProjectionCache {
    fn default() -> Self {
        Self::new(crate::config::GridProcessorConfig::default().projection_cache_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_memoizes_and_counts() {
        let calls = AtomicUsize::new(0);
        let proj = |lon: f64, lat: f64| {
            calls.fetch_add(1, Ordering::Relaxed);
            Some((lon * 2.0, lat * 2.0))
        };
        let mut cache = ProjectionCache::new(16);

        assert_eq!(cache.project(&proj, 1.0, 2.0), Some([2.0, 4.0]));
        assert_eq!(cache.project(&proj, 1.0, 2.0), Some([2.0, 4.0]));
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_failures_are_cached() {
        let proj = |_: f64, lat: f64| (lat.abs() < 90.0).then_some((0.0, lat));
        let mut cache = ProjectionCache::new(4);
        assert_eq!(cache.project(&proj, 0.0, 90.0), None);
        assert!(cache.contains(0.0, 90.0));
        assert_eq!(cache.project(&proj, 0.0, 90.0), None);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let proj = |lon: f64, lat: f64| Some((lon, lat));
        let mut cache = ProjectionCache::new(2);
        cache.project(&proj, 1.0, 0.0);
        cache.project(&proj, 2.0, 0.0);
        cache.project(&proj, 3.0, 0.0);

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(1.0, 0.0));
        assert!(cache.contains(3.0, 0.0));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let proj = |lon: f64, lat: f64| Some((lon, lat));
        let mut cache = ProjectionCache::new(0);
        assert_eq!(cache.project(&proj, 5.0, 5.0), Some([5.0, 5.0]));
        assert_eq!(cache.len(), 1);
    }
}
