//! Worker scheduling for metric calculations.
//!
//! Results always come back in input order. With `max_parallel <= 1` items run
//! sequentially on the calling thread; otherwise on a dedicated rayon pool of
//! exactly `max_parallel` threads, built per call and dropped afterwards.

use rayon::prelude::*;

use crate::ExecError;

pub fn execute<I, T, F>(items: &[I], max_parallel: usize, f: F) -> Result<Vec<T>, ExecError>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync,
{
    if max_parallel <= 1 || items.len() <= 1 {
        return Ok(items.iter().map(|item| f(item)).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_parallel)
        .thread_name(|i| format!("mqr-worker-{i}"))
        .build()
        .map_err(|e| ExecError::Pool(e.to_string()))?;

    Ok(pool.install(|| items.par_iter().map(|item| f(item)).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn sequential_keeps_order() {
        let out = execute(&[3, 1, 2], 1, |x| x * 10).unwrap();
        assert_eq!(out, vec![30, 10, 20]);
    }

    #[test]
    fn parallel_keeps_order_and_uses_workers() {
        let items: Vec<usize> = (0..64).collect();
        let threads = Mutex::new(HashSet::new());
        let out = execute(&items, 4, |x| {
            threads
                .lock()
                .unwrap()
                .insert(std::thread::current().name().map(str::to_string));
            *x
        })
        .unwrap();
        assert_eq!(out, items);
        let threads = threads.into_inner().unwrap();
        assert!(threads
            .iter()
            .all(|n| n.as_deref().is_some_and(|n| n.starts_with("mqr-worker-"))));
    }
}
