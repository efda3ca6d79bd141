//! Caching proxy: in-memory memoization in front of any [`Predictor`].

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::OnceCell;

use super::{CacheStats, CacheStatus, Counters, ReleaseEmpty};
use crate::predictor::Predictor;

/// Wraps a predictor with a per-instance, unbounded result cache.
///
/// Holds one slot per key. The first request for a key fills the slot; requests arriving while
/// it is being filled wait on it rather than calling the model again. A failed or abandoned
/// computation leaves the slot empty, and the slot is dropped once no request is waiting on it.
pub struct CachingProxy<P>
where
    P: Predictor,
{
    inner: P,
    slots: DashMap<P::Input, Arc<OnceCell<P::Output>>>,
    counters: Counters,
}

impl<P> CachingProxy<P>
where
    P: Predictor,
    P::Input: Eq + Hash + Clone + Debug,
{
    /// Create a proxy with an empty cache.
    pub fn new(inner: P) -> Self {
        tracing::debug!("caching proxy created");
        Self {
            inner,
            slots: DashMap::new(),
            counters: Counters::default(),
        }
    }

    /// Like [`Predictor::predict`], also reporting whether the cache answered.
    pub async fn predict_with_status(
        &self,
        input: &P::Input,
    ) -> Result<(P::Output, CacheStatus), P::Error> {
        if let Some(value) = self.cached(input) {
            tracing::debug!(key = ?input, "cache hit");
            self.counters.record(CacheStatus::Hit);
            return Ok((value, CacheStatus::Hit));
        }

        let _release = ReleaseEmpty::new(&self.slots, input);
        let slot = self.slot(input);
        let inner = &self.inner;
        let computed = &AtomicBool::new(false);
        let result = slot
            .get_or_try_init(move || async move {
                tracing::debug!(key = ?input, "cache miss, calling model");
                computed.store(true, Ordering::Relaxed);
                inner.predict(input).await
            })
            .await
            .map(Clone::clone);

        match result {
            Ok(value) => {
                let status = if computed.load(Ordering::Relaxed) {
                    tracing::debug!(key = ?input, "cached prediction");
                    CacheStatus::Miss
                } else {
                    tracing::debug!(key = ?input, "cache hit after waiting on in-flight request");
                    CacheStatus::Hit
                };
                self.counters.record(status);
                Ok((value, status))
            }
            Err(e) => {
                tracing::warn!(key = ?input, "model failed, nothing cached");
                self.counters.record_failure();
                Err(e)
            }
        }
    }

    /// True if a prediction for `input` is cached.
    pub fn contains(&self, input: &P::Input) -> bool {
        self.slots
            .get(input)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    /// Number of cached predictions.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }

    /// Get reference to the wrapped predictor.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn cached(&self, input: &P::Input) -> Option<P::Output> {
        self.slots.get(input).and_then(|slot| slot.get().cloned())
    }

    fn slot(&self, input: &P::Input) -> Arc<OnceCell<P::Output>> {
        if let Some(slot) = self.slots.get(input) {
            return Arc::clone(slot.value());
        }
        Arc::clone(&self.slots.entry(input.clone()).or_default())
    }

    /// Map entries including empty slots of requests in flight.
    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[async_trait]
impl<P> Predictor for CachingProxy<P>
where
    P: Predictor,
    P::Input: Eq + Hash + Clone + Debug,
{
    type Input = P::Input;
    type Output = P::Output;
    type Error = P::Error;

    async fn predict(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.predict_with_status(input)
            .await
            .map(|(value, _)| value)
    }
}
