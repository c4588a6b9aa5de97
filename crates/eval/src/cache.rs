//! Memoizing decorator around any [`Calculator`].
//!
//! Results are keyed by the validated `(madhab, estate, heirs)` triple and
//! stored whole; a cached value is never mutated. Eviction is LRU at a
//! fixed capacity. Only successful results are cached, and a poisoned lock
//! is logged and bypassed so the cache can never change an outcome.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lru::LruCache;
use mirath_core::{EstateData, HeirsData, Madhab};
use tracing::warn;

use crate::config::CacheConfig;
use crate::engine::Calculator;
use crate::result::{CalculationRequest, CalculationResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    madhab: Madhab,
    estate: EstateData,
    heirs: HeirsData,
}

/// `LruCache::get` updates recency, so reads need exclusive access too.
type ResultCache = Mutex<LruCache<CacheKey, CalculationResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

pub struct CachedEngine<C: Calculator> {
    inner: C,
    /// `None` when the configured capacity is 0.
    entries: Option<ResultCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<C: Calculator> CachedEngine<C> {
    pub fn new(inner: C, config: &CacheConfig) -> Self {
        CachedEngine {
            inner,
            entries: NonZeroUsize::new(config.capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        let len = match &self.entries {
            Some(entries) => match entries.lock() {
                Ok(cache) => cache.len(),
                Err(poisoned) => poisoned.into_inner().len(),
            },
            None => 0,
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len,
        }
    }

    pub fn clear(&self) {
        let Some(entries) = &self.entries else {
            return;
        };
        match entries.lock() {
            Ok(mut cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn lookup(entries: &ResultCache, key: &CacheKey) -> Option<CalculationResult> {
        match entries.lock() {
            Ok(mut cache) => cache.get(key).cloned(),
            Err(_) => {
                warn!("result cache lock poisoned; bypassing");
                None
            }
        }
    }

    fn store(entries: &ResultCache, key: CacheKey, result: &CalculationResult) {
        let Ok(mut cache) = entries.lock() else {
            warn!("result cache lock poisoned; not storing");
            return;
        };
        cache.put(key, result.clone());
    }
}

impl<C: Calculator> Calculator for CachedEngine<C> {
    fn calculate(&self, request: &CalculationRequest) -> CalculationResult {
        let Some(entries) = &self.entries else {
            return self.inner.calculate(request);
        };
        // invalid requests are not cached
        let Ok((madhab, estate, heirs)) = request.parse() else {
            return self.inner.calculate(request);
        };
        let key = CacheKey {
            madhab,
            estate,
            heirs,
        };

        if let Some(hit) = Self::lookup(entries, &key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.calculate(request);
        if result.success {
            Self::store(entries, key, &result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn request(total: i64) -> CalculationRequest {
        CalculationRequest::new("hanafi", EstateData::new(total.into()))
            .heir("son", 1)
            .heir("wife", 1)
    }

    fn cached(capacity: usize) -> CachedEngine<Engine> {
        CachedEngine::new(Engine::classical(), &CacheConfig { capacity })
    }

    #[test]
    fn second_call_is_a_hit() {
        let cache = cached(8);
        let first = cache.calculate(&request(1000));
        let second = cache.calculate(&request(1000));
        assert_eq!(first, second);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                len: 1
            }
        );
    }

    #[test]
    fn equivalent_requests_share_an_entry() {
        let cache = cached(8);
        cache.calculate(&request(1000));
        let alias = CalculationRequest::new("Hanafi", EstateData::new(dec!(1000)))
            .heir("Wife", 1)
            .heir("son", 1);
        cache.calculate(&alias);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = cached(8);
        let bad = CalculationRequest::new("hanafi", EstateData::new(dec!(10)));
        assert!(!cache.calculate(&bad).success);
        assert_eq!(cache.stats().len, 0);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let cache = cached(2);
        cache.calculate(&request(1));
        cache.calculate(&request(2));
        // touching 1 leaves 2 as the least recently used
        cache.calculate(&request(1));
        assert_eq!(cache.stats().hits, 1);
        cache.calculate(&request(3));
        assert_eq!(cache.stats().len, 2);
        cache.calculate(&request(1));
        assert_eq!(cache.stats().hits, 2);
        cache.calculate(&request(2));
        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = cached(0);
        cache.calculate(&request(5));
        cache.calculate(&request(5));
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 0, len: 0 });
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = cached(4);
        cache.calculate(&request(5));
        cache.clear();
        assert_eq!(cache.stats().len, 0);
    }

    #[test]
    fn poisoned_lock_is_bypassed() {
        let cache = Arc::new(cached(4));
        let poisoner = Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.as_ref().unwrap().lock().unwrap();
            panic!("poison the cache lock");
        })
        .join();
        assert!(cache.entries.as_ref().unwrap().is_poisoned());

        let result = cache.calculate(&request(900));
        assert!(result.success);
        assert_eq!(result.total_amount(), dec!(900));
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(cached(16));
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.calculate(&request(100 * (i % 4 + 1))).success)
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8);
        assert!(stats.len <= 4);
    }
}
