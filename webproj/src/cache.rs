//! Transformer cache keyed by (source, target) CRS pair.
//!
//! Each distinct pair is constructed at most once, even when many requests
//! ask for it at the same time, and every lookup afterwards returns the same
//! shared [`Transformer`]. Entries are never evicted: the key space is the set
//! of CRS pairs ever requested, which stays small.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::error::{Result, WebprojError};
use crate::geodesy::{GeodesyEngine, Transformation};

/// Ordered (source, target) pair. Forward and inverse are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformerKey {
    pub src: String,
    pub dst: String,
}

impl TransformerKey {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }
}

impl fmt::Display for TransformerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// A constructed transformation bound to its key.
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug)]
pub struct Transformer {
    key: TransformerKey,
    inner: Box<dyn Transformation>,
}

impl Transformer {
    pub fn key(&self) -> &TransformerKey {
        &self.key
    }

    /// Transform a point, see [`Transformation::apply`].
    pub fn apply(&self, point: (f64, f64, f64)) -> Result<(f64, f64, f64)> {
        self.inner.apply(point)
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of transformers currently in the cache.
    pub entry_count: u64,
    /// Number of lookups served from the cache.
    pub hit_count: u64,
    /// Number of constructions attempted.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Memoizing factory of [`Transformer`]s.
pub struct TransformerCache {
    engine: Arc<dyn GeodesyEngine>,
    transformers: Cache<TransformerKey, Arc<Transformer>>,
    lookup_count: AtomicU64,
    miss_count: AtomicU64,
}

impl TransformerCache {
    /// Create an empty cache that builds transformers with `engine`.
    pub fn new(engine: Arc<dyn GeodesyEngine>) -> Self {
        Self {
            engine,
            // No capacity bound and no expiry: entries live for the process lifetime
            transformers: Cache::builder().build(),
            lookup_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Get the transformer for `key`, constructing it on first use.
    ///
    /// Concurrent first requests for the same key run a single construction
    /// and all receive its result; requests for other keys are not blocked.
    /// Failed constructions are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`WebprojError::Construction`] if the engine cannot build the
    /// transformation.
    pub fn get(&self, key: &TransformerKey) -> Result<Arc<Transformer>> {
        self.lookup_count.fetch_add(1, Ordering::Relaxed);

        if let Some(transformer) = self.transformers.get(key) {
            return Ok(transformer);
        }

        self.transformers
            .try_get_with_by_ref(key, || -> Result<Arc<Transformer>> {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Constructing transformer");

                let inner = self.engine.construct(&key.src, &key.dst)?;
                Ok(Arc::new(Transformer {
                    key: key.clone(),
                    inner,
                }))
            })
            .map_err(|e: Arc<WebprojError>| unshare_error(key, &e))
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let lookups = self.lookup_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        CacheStats {
            entry_count: self.transformers.entry_count(),
            hit_count: lookups.saturating_sub(misses),
            miss_count: misses,
        }
    }

    /// Flush pending cache maintenance so `stats().entry_count` is exact.
    pub fn sync(&self) {
        self.transformers.run_pending_tasks();
    }
}

/// moka shares an initializer's error between all waiting callers.
fn unshare_error(key: &TransformerKey, err: &WebprojError) -> WebprojError {
    match err {
        WebprojError::Construction { src, dst, reason } => WebprojError::Construction {
            src: src.clone(),
            dst: dst.clone(),
            reason: reason.clone(),
        },
        other => WebprojError::Construction {
            src: key.src.clone(),
            dst: key.dst.clone(),
            reason: other.to_string(),
        },
    }
}
