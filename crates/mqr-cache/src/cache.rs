//! Single-flight memoization keyed by computation identity.
//!
//! Entry lifecycle: `Pending -> Done | Failed`, terminal once resolved. The
//! first requester of a key inserts a `Pending` slot and runs the supplied
//! closure outside every lock; later requesters park on that slot's condvar
//! and receive a clone of the published outcome. Failures are cached and
//! replayed exactly like successes, so a broken computation runs once.
//!
//! The key map lock is only held for lookup/insert. Waiting happens on the
//! per-key slot, so waits never cross keys.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::error::Interrupted;
use crate::stats::CacheStats;

/// How a request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// This caller ran the computation.
    Executed,
    /// Another caller ran (or was running) it; this one received its outcome.
    Served,
}

/// Observable state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Done,
    Failed,
}

enum SlotState<V, E> {
    Pending,
    Done(V),
    Failed(E),
}

struct Slot<V, E> {
    state: Mutex<SlotState<V, E>>,
    ready: Condvar,
}

impl<V: Clone, E: Clone> Slot<V, E> {
    fn pending() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
        }
    }

    fn publish(&self, outcome: Result<V, E>) {
        {
            let mut state = self.state.lock();
            // First publication wins; the slot never leaves a terminal state.
            if matches!(*state, SlotState::Pending) {
                *state = match outcome {
                    Ok(v) => SlotState::Done(v),
                    Err(e) => SlotState::Failed(e),
                };
            }
        }
        self.ready.notify_all();
    }

    fn wait(&self) -> Result<V, E> {
        let mut state = self.state.lock();
        while matches!(*state, SlotState::Pending) {
            self.ready.wait(&mut state);
        }
        match &*state {
            SlotState::Done(v) => Ok(v.clone()),
            SlotState::Failed(e) => Err(e.clone()),
            SlotState::Pending => unreachable!("loop exits only on a terminal state"),
        }
    }

    fn state(&self) -> EntryState {
        match &*self.state.lock() {
            SlotState::Pending => EntryState::Pending,
            SlotState::Done(_) => EntryState::Done,
            SlotState::Failed(_) => EntryState::Failed,
        }
    }
}

/// Publishes an `Interrupted` failure if the executing caller unwinds.
struct Publisher<'a, K, V, E>
where
    K: Display,
    V: Clone,
    E: Clone + From<Interrupted>,
{
    slot: &'a Slot<V, E>,
    key: &'a K,
    stats: &'a CacheStats,
    armed: bool,
}

impl<K, V, E> Drop for Publisher<'_, K, V, E>
where
    K: Display,
    V: Clone,
    E: Clone + From<Interrupted>,
{
    fn drop(&mut self) {
        if self.armed {
            self.stats.record_execution(true);
            self.slot.publish(Err(E::from(Interrupted {
                key: self.key.to_string(),
            })));
        }
    }
}

pub struct ExecutionCache<K, V, E> {
    slots: Mutex<HashMap<K, Arc<Slot<V, E>>>>,
    stats: CacheStats,
}

impl<K, V, E> Default for ExecutionCache<K, V, E> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            stats: CacheStats::new(),
        }
    }
}

impl<K, V, E> ExecutionCache<K, V, E>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
    E: Clone + From<Interrupted>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the outcome for `key`, running `compute` only if no entry exists.
    ///
    /// `compute` is invoked at most once per key for the lifetime of the cache
    /// and never while any cache lock is held.
    pub fn get_or_compute<F>(&self, key: &K, compute: F) -> (Result<V, E>, Resolution)
    where
        F: FnOnce() -> Result<V, E>,
    {
        let (slot, owner) = {
            let mut slots = self.slots.lock();
            match slots.get(key) {
                Some(slot) => (Arc::clone(slot), false),
                None => {
                    let slot = Arc::new(Slot::pending());
                    slots.insert(key.clone(), Arc::clone(&slot));
                    (slot, true)
                }
            }
        };

        if !owner {
            self.stats.record_served();
            let outcome = slot.wait();
            debug!(%key, failed = outcome.is_err(), "served from execution cache");
            return (outcome, Resolution::Served);
        }

        debug!(%key, "executing computation");
        let mut publisher = Publisher {
            slot: &slot,
            key,
            stats: &self.stats,
            armed: true,
        };
        let outcome = compute();
        publisher.armed = false;

        self.stats.record_execution(outcome.is_err());
        slot.publish(outcome.clone());
        debug!(%key, failed = outcome.is_err(), "computation resolved");
        (outcome, Resolution::Executed)
    }

    pub fn state(&self, key: &K) -> Option<EntryState> {
        let slot = self.slots.lock().get(key).map(Arc::clone)?;
        Some(slot.state())
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        Boom,
        Interrupted(String),
    }

    impl From<Interrupted> for TestError {
        fn from(e: Interrupted) -> Self {
            TestError::Interrupted(e.key)
        }
    }

    #[test]
    fn entry_states_follow_outcomes() {
        let cache: ExecutionCache<String, u32, TestError> = ExecutionCache::new();
        let ok = "ok".to_string();
        let bad = "bad".to_string();

        assert_eq!(cache.state(&ok), None);
        let (v, r) = cache.get_or_compute(&ok, || Ok(7));
        assert_eq!((v, r), (Ok(7), Resolution::Executed));
        assert_eq!(cache.state(&ok), Some(EntryState::Done));

        let (e, _) = cache.get_or_compute(&bad, || Err(TestError::Boom));
        assert_eq!(e, Err(TestError::Boom));
        assert_eq!(cache.state(&bad), Some(EntryState::Failed));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn panicking_computation_is_cached_as_interrupted() {
        let cache: ExecutionCache<String, u32, TestError> = ExecutionCache::new();
        let key = "explodes".to_string();

        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_compute(&key, || panic!("unit blew up"))
        }));
        assert!(caught.is_err());
        assert_eq!(cache.state(&key), Some(EntryState::Failed));

        let (again, r) = cache.get_or_compute(&key, || Ok(1));
        assert_eq!(again, Err(TestError::Interrupted("explodes".into())));
        assert_eq!(r, Resolution::Served);
        assert_eq!(cache.stats().executions(), 1);
        assert_eq!(cache.stats().failures(), 1);
    }
}
