//! Bounded LRU cache for constructed zone records

use crate::error::Result;
use crate::zone::ZoneInfo;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::trace;

/// Default number of zone templates retained: only the most recently built.
pub const DEFAULT_CACHE_SIZE: usize = 1;

/// Bounded LRU cache of zone templates, keyed by zone id.
///
/// Construction is expensive, so a hit returns a clone of the retained
/// template rather than rebuilding. The lock is held across the whole
/// check-construct-insert sequence: at most one construction runs at a time,
/// and concurrent requests for the same id observe a single build. Capacity
/// is tiny and builds are infrequent, so a single global lock suffices.
pub struct ZoneCache {
    entries: Mutex<LruCache<String, ZoneInfo>>,
}

impl ZoneCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap());
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return a clone of the cached template for `id`, building it with
    /// `build` on a miss.
    ///
    /// A failed build caches nothing; the error surfaces to the caller and a
    /// later request retries.
    pub fn get_or_try_build(
        &self,
        id: &str,
        build: impl FnOnce() -> Result<ZoneInfo>,
    ) -> Result<ZoneInfo> {
        let mut entries = self.entries.lock();
        if let Some(template) = entries.get(id) {
            trace!("zone cache hit for {}", id);
            return Ok(template.clone());
        }

        trace!("zone cache miss for {}", id);
        let template = build()?;
        let copy = template.clone();
        entries.put(id.to_string(), template);
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TzDataError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_build(counter: &AtomicUsize, id: &str) -> Result<ZoneInfo> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(ZoneInfo::fixed_utc(id))
    }

    #[test]
    fn test_hit_does_not_rebuild() {
        let cache = ZoneCache::new(1);
        let builds = AtomicUsize::new(0);

        cache
            .get_or_try_build("GMT", || counted_build(&builds, "GMT"))
            .unwrap();
        cache
            .get_or_try_build("GMT", || counted_build(&builds, "GMT"))
            .unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capacity_one_evicts_previous_entry() {
        let cache = ZoneCache::new(1);
        let builds = AtomicUsize::new(0);

        // A, B, A: the second A must rebuild because B evicted it.
        for id in ["A", "B", "A"] {
            cache
                .get_or_try_build(id, || counted_build(&builds, id))
                .unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_returned_clones_are_independent() {
        let cache = ZoneCache::new(1);
        let mut first = cache
            .get_or_try_build("GMT", || Ok(ZoneInfo::fixed_utc("GMT")))
            .unwrap();
        first.set_raw_offset_secs(1234);

        let second = cache
            .get_or_try_build("GMT", || panic!("must be cached"))
            .unwrap();
        assert_eq!(second.raw_offset_secs(), 0);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = ZoneCache::new(1);
        let builds = AtomicUsize::new(0);

        let err = cache.get_or_try_build("GMT", || {
            builds.fetch_add(1, Ordering::SeqCst);
            Err(TzDataError::InvalidZoneRecord {
                id: "GMT".to_string(),
                reason: "truncated".to_string(),
            })
        });
        assert!(err.is_err());

        cache
            .get_or_try_build("GMT", || counted_build(&builds, "GMT"))
            .unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }
}
