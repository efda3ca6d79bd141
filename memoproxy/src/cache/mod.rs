//! Memoizing caches for model predictions.
//!
//! Two forms share the same contract: the first successful computation for a key is stored and
//! returned on every later request, failures are never stored, and concurrent requests for one
//! key share a single computation.
//!
//! - [`CachingProxy`]: wraps an async [`Predictor`](crate::Predictor) and is a `Predictor` itself.
//! - [`Memoized`]: wraps a plain synchronous function.
//!
//! Each instance owns its own map. Nothing is shared between two proxies wrapping the same model.

mod memoize;
mod proxy;

pub use memoize::Memoized;
pub use proxy::CachingProxy;

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

/// Whether one request was answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Value was already cached, or was computed by a concurrent request this one waited on.
    Hit,
    /// This request ran the computation.
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests answered without running the computation.
    pub hits: u64,
    /// Requests that ran the computation successfully.
    pub misses: u64,
    /// Requests whose computation failed.
    pub failures: u64,
    /// Keys currently cached.
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn record(&self, status: CacheStatus) {
        let counter = match status {
            CacheStatus::Hit => &self.hits,
            CacheStatus::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// A per-key cell that is either empty or holds the cached value.
trait Slot {
    fn is_filled(&self) -> bool;
}

impl<V> Slot for tokio::sync::OnceCell<V> {
    fn is_filled(&self) -> bool {
        self.initialized()
    }
}

impl<V> Slot for once_cell::sync::OnceCell<V> {
    fn is_filled(&self) -> bool {
        self.get().is_some()
    }
}

/// Removes the entry for `key` on drop if its slot is still empty and nobody else holds it.
///
/// Create it before taking the slot so the caller's `Arc` is released first. Runs on success,
/// failure, a dropped future and unwinding alike.
struct ReleaseEmpty<'a, K, C>
where
    K: Eq + Hash,
    C: Slot,
{
    slots: &'a DashMap<K, Arc<C>>,
    key: &'a K,
}

impl<'a, K, C> ReleaseEmpty<'a, K, C>
where
    K: Eq + Hash,
    C: Slot,
{
    fn new(slots: &'a DashMap<K, Arc<C>>, key: &'a K) -> Self {
        Self { slots, key }
    }
}

impl<K, C> Drop for ReleaseEmpty<'_, K, C>
where
    K: Eq + Hash,
    C: Slot,
{
    fn drop(&mut self) {
        self.slots
            .remove_if(self.key, |_, slot| !slot.is_filled() && Arc::strong_count(slot) == 1);
    }
}
