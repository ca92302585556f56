//! Single-flight behavior of the execution cache under real threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Barrier};
use std::thread;
use std::time::Duration;

use mqr_cache::{EntryState, ExecutionCache, Interrupted, Resolution};

#[derive(Debug, Clone, PartialEq)]
enum TestError {
    Boom(String),
    Interrupted,
}

impl From<Interrupted> for TestError {
    fn from(_: Interrupted) -> Self {
        TestError::Interrupted
    }
}

type Cache = ExecutionCache<String, u64, TestError>;

#[test]
fn concurrent_requests_execute_once() {
    const CALLERS: usize = 8;
    let cache = Cache::new();
    let calls = AtomicUsize::new(0);
    let barrier = Barrier::new(CALLERS);
    let key = "error_bias@default{}".to_string();

    let outcomes: Vec<(Result<u64, TestError>, Resolution)> = thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache.get_or_compute(&key, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(50));
                        Ok(42)
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(outcomes.iter().all(|(r, _)| r == &Ok(42)));
    let executed = outcomes
        .iter()
        .filter(|(_, res)| *res == Resolution::Executed)
        .count();
    assert_eq!(executed, 1);
    assert_eq!(cache.stats().executions(), 1);
    assert_eq!(cache.stats().served(), (CALLERS - 1) as u64);
    assert_eq!(cache.state(&key), Some(EntryState::Done));
}

#[test]
fn failures_are_replayed_without_rerunning() {
    let cache = Cache::new();
    let calls = AtomicUsize::new(0);
    let key = "regression_quality@broken{}".to_string();
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(TestError::Boom("target column 'missing' not found".into()))
    };

    let (first, r1) = cache.get_or_compute(&key, compute);
    let (second, r2) = cache.get_or_compute(&key, compute);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!((r1, r2), (Resolution::Executed, Resolution::Served));
    assert_eq!(cache.state(&key), Some(EntryState::Failed));
    assert_eq!(cache.stats().failures(), 1);
}

#[test]
fn distinct_keys_do_not_block_each_other() {
    let cache = Cache::new();
    let slow = "slow".to_string();
    let fast = "fast".to_string();
    let (release, gate) = mpsc::channel::<()>();

    thread::scope(|s| {
        let owner = s.spawn({
            let (cache, slow) = (&cache, &slow);
            move || {
                cache.get_or_compute(slow, || {
                    gate.recv().ok();
                    Ok(1)
                })
            }
        });

        while cache.state(&slow) != Some(EntryState::Pending) {
            thread::yield_now();
        }

        // Completes while `slow` is still pending.
        let (value, resolution) = cache.get_or_compute(&fast, || Ok(2));
        assert_eq!(value, Ok(2));
        assert_eq!(resolution, Resolution::Executed);
        assert_eq!(cache.state(&slow), Some(EntryState::Pending));

        release.send(()).unwrap();
        assert_eq!(owner.join().unwrap().0, Ok(1));
    });

    assert_eq!(cache.len(), 2);
}

#[test]
fn waiters_see_interrupted_when_owner_panics() {
    let cache = Cache::new();
    let key = "predicted_vs_actual@default{max_points=10}".to_string();

    let panicked = thread::scope(|s| {
        s.spawn(|| {
            cache.get_or_compute(&key, || -> Result<u64, TestError> { panic!("unit blew up") })
        })
        .join()
        .is_err()
    });
    assert!(panicked);

    let calls = AtomicUsize::new(0);
    let (outcome, resolution) = cache.get_or_compute(&key, || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(7)
    });
    assert_eq!(outcome, Err(TestError::Interrupted));
    assert_eq!(resolution, Resolution::Served);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
