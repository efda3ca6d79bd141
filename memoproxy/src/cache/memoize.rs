//! Function memoization: the synchronous counterpart of [`CachingProxy`](super::CachingProxy).

use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use super::{CacheStats, CacheStatus, Counters, ReleaseEmpty};

/// A function wrapped with its own result cache.
///
/// Keys are usually [`CallArgs`](crate::CallArgs), which makes keyword order irrelevant. Threads
/// calling with the same key while it is being computed block until the value is ready. If the
/// function fails or panics, nothing is stored and the next caller runs it again.
///
/// ```
/// use memoproxy::{CallArgs, Memoized};
///
/// let classify = Memoized::new(|args: &CallArgs| {
///     let text = args.first_text().unwrap_or_default();
///     Ok::<_, ()>(if text.contains("happy") { 1 } else { 0 })
/// });
/// assert_eq!(classify.call(&CallArgs::from("happy face")), Ok(1));
/// assert!(classify.contains(&CallArgs::from("happy face")));
/// ```
pub struct Memoized<F, K, V, E> {
    f: F,
    slots: DashMap<K, Arc<OnceCell<V>>>,
    counters: Counters,
    _marker: PhantomData<fn() -> E>,
}

impl<F, K, V, E> Memoized<F, K, V, E>
where
    F: Fn(&K) -> Result<V, E>,
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            slots: DashMap::new(),
            counters: Counters::default(),
            _marker: PhantomData,
        }
    }

    /// Returns the cached value for `args`, computing and storing it on first use.
    pub fn call(&self, args: &K) -> Result<V, E> {
        self.call_with_status(args).map(|(value, _)| value)
    }

    pub fn call_with_status(&self, args: &K) -> Result<(V, CacheStatus), E> {
        if let Some(value) = self.slots.get(args).and_then(|slot| slot.get().cloned()) {
            tracing::debug!(key = ?args, "memo hit");
            self.counters.record(CacheStatus::Hit);
            return Ok((value, CacheStatus::Hit));
        }

        let _release = ReleaseEmpty::new(&self.slots, args);
        let slot = self.slot(args);
        let mut computed = false;
        let result = slot
            .get_or_try_init(|| {
                computed = true;
                tracing::debug!(key = ?args, "memo miss, calling function");
                (self.f)(args)
            })
            .map(Clone::clone);

        match result {
            Ok(value) => {
                let status = if computed {
                    CacheStatus::Miss
                } else {
                    tracing::debug!(key = ?args, "memo hit after waiting on another thread");
                    CacheStatus::Hit
                };
                self.counters.record(status);
                Ok((value, status))
            }
            Err(e) => {
                tracing::warn!(key = ?args, "memoized function failed, nothing cached");
                self.counters.record_failure();
                Err(e)
            }
        }
    }

    pub fn contains(&self, args: &K) -> bool {
        self.slots
            .get(args)
            .map(|slot| slot.get().is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }

    fn slot(&self, args: &K) -> Arc<OnceCell<V>> {
        if let Some(slot) = self.slots.get(args) {
            return Arc::clone(slot.value());
        }
        Arc::clone(&self.slots.entry(args.clone()).or_default())
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::key::CallArgs;

    fn classify(text: &str) -> i64 {
        if text.contains("happy") {
            1
        } else if text.contains("sad") {
            -1
        } else {
            0
        }
    }

    #[test]
    fn repeats_are_served_from_cache() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(|args: &CallArgs| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(classify(args.first_text().unwrap_or_default()))
        });

        let outputs: Vec<i64> = ["happy face", "sad face", "cat face", "sad face", "cat face"]
            .into_iter()
            .map(|t| memo.call(&CallArgs::from(t)).unwrap())
            .collect();

        assert_eq!(outputs, vec![1, -1, 0, -1, 0]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(memo.len(), 3);
        assert_eq!(memo.stats().hits, 2);
    }

    #[test]
    fn keyword_order_shares_entry() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(|args: &CallArgs| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(args.to_string())
        });
        let a = CallArgs::new().arg("t").kwarg("x", 1_i64).kwarg("y", 2_i64);
        let b = CallArgs::new().arg("t").kwarg("y", 2_i64).kwarg("x", 1_i64);

        let (_, first) = memo.call_with_status(&a).unwrap();
        let (_, second) = memo.call_with_status(&b).unwrap();
        assert_eq!((first, second), (CacheStatus::Miss, CacheStatus::Hit));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_is_returned_and_not_cached() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(|k: &String| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(format!("cannot score {}", k))
            } else {
                Ok(k.len())
            }
        });
        let key = "abc".to_string();
        assert_eq!(memo.call(&key), Err("cannot score abc".to_string()));
        assert!(!memo.contains(&key));
        assert_eq!(memo.call(&key), Ok(3));
        assert_eq!(memo.call(&key), Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.stats().failures, 1);
    }

    #[test]
    fn two_instances_do_not_share_cache() {
        let calls = AtomicUsize::new(0);
        let f = |k: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(k.clone())
        };
        let a = Memoized::new(f);
        let b = Memoized::new(f);
        a.call(&"k".to_string()).unwrap();
        b.call(&"k".to_string()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn threads_share_one_computation() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(|k: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok::<_, ()>(k.len())
        });
        let key = "shared".to_string();
        std::thread::scope(|s| {
            for _ in 0..6 {
                s.spawn(|| assert_eq!(memo.call(&key), Ok(6)));
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.stats().misses, 1);
        assert_eq!(memo.stats().hits, 5);
    }

    #[test]
    fn panic_leaves_no_slot_and_next_call_recomputes() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(|k: &String| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("scorer crashed on {}", k);
            }
            Ok::<_, ()>(k.len())
        });
        let key = "boom".to_string();

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| memo.call(&key)));
        assert!(outcome.is_err());
        assert_eq!(memo.slot_count(), 0);

        assert_eq!(memo.call(&key), Ok(4));
        assert_eq!(memo.slot_count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn threads_with_failing_function_each_retry() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(|k: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            Err::<usize, _>(format!("cannot score {}", k))
        });
        let key = "doomed".to_string();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert_eq!(memo.call(&key), Err("cannot score doomed".to_string())));
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(memo.is_empty());
        assert_eq!(memo.slot_count(), 0);
        assert_eq!(memo.stats().failures, 4);
    }
}
