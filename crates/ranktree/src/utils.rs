//! Common utilities used across the crate.
//!
//! This module provides the bulk-synchronous [`TaskRunner`] used by histogram
//! construction, split search and pairwise-gradient computation, plus the
//! slice helpers that hand each worker a disjoint region of shared output.

use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;

use crate::training::TrainError;

// =============================================================================
// Task Runner
// =============================================================================

/// Fixed-size worker pool executing range-partitioned work behind a barrier.
///
/// Every parallel phase follows the same shape: partition `[0, n)` into
/// contiguous chunks, run one task per chunk, and block until all of them
/// finish before the caller reads the combined output. Tasks never share
/// writable memory; each receives its own disjoint slice.
///
/// With a pool size of 1 no threads are spawned and the chunks run in order
/// on the calling thread, using the same partition logic, so results do not
/// depend on the pool size.
///
/// Cloning is cheap; clones share the underlying pool.
///
/// # Example
///
/// ```
/// use ranktree::TaskRunner;
///
/// let runner = TaskRunner::new(4).unwrap();
/// assert_eq!(runner.partition(10), vec![0, 3, 6, 8, 10]);
///
/// let sums = runner.execute("sum", 10, |range| range.sum::<usize>()).unwrap();
/// assert_eq!(sums.iter().sum::<usize>(), 45);
/// ```
#[derive(Clone, Debug)]
pub struct TaskRunner {
    pool: Option<Arc<rayon::ThreadPool>>,
    size: usize,
}

impl TaskRunner {
    /// Create a runner with `n_threads` workers.
    ///
    /// Thread count semantics:
    /// - `0` = auto (available hardware concurrency)
    /// - `1` = sequential (no pool)
    /// - `n > 1` = exactly `n` workers
    pub fn new(n_threads: usize) -> Result<Self, TrainError> {
        let size = match n_threads {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        if size == 1 {
            return Ok(Self::sequential());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("ranktree-worker-{i}"))
            .build()?;
        Ok(Self { pool: Some(Arc::new(pool)), size })
    }

    /// Single-threaded runner.
    pub fn sequential() -> Self {
        Self { pool: None, size: 1 }
    }

    /// Number of workers.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Chunk boundaries splitting `[0, n)` into `min(n, size)` near-equal parts.
    ///
    /// Returns `chunks + 1` ascending offsets starting at 0 and ending at `n`;
    /// the first `n % chunks` chunks are one element longer.
    pub fn partition(&self, n: usize) -> Vec<usize> {
        let n_chunks = n.min(self.size);
        if n_chunks == 0 {
            return vec![0];
        }
        let chunk = n / n_chunks;
        let rem = n % n_chunks;
        let mut bounds = Vec::with_capacity(n_chunks + 1);
        bounds.push(0);
        for i in 1..=n_chunks {
            let prev = bounds[i - 1];
            bounds.push(prev + chunk + usize::from(i <= rem));
        }
        bounds
    }

    /// Chunk ranges of [`partition`](Self::partition).
    pub fn ranges(&self, n: usize) -> Vec<Range<usize>> {
        self.partition(n).windows(2).map(|w| w[0]..w[1]).collect()
    }

    /// Run `task` once per chunk of `[0, n)` and wait for all chunks.
    ///
    /// Results come back in chunk order. A panicking task aborts the phase
    /// with [`TrainError::WorkerPanicked`].
    pub fn execute<R, F>(&self, name: &'static str, n: usize, task: F) -> Result<Vec<R>, TrainError>
    where
        R: Send,
        F: Fn(Range<usize>) -> R + Sync + Send,
    {
        self.run_all(name, self.ranges(n), task)
    }

    /// Run `task` on each pre-built job and wait for all of them.
    ///
    /// This is the barrier primitive behind [`execute`](Self::execute); it is
    /// used directly when jobs carry disjoint mutable slices.
    pub fn run_all<J, R, F>(&self, name: &'static str, jobs: Vec<J>, task: F) -> Result<Vec<R>, TrainError>
    where
        J: Send,
        R: Send,
        F: Fn(J) -> R + Sync + Send,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &self.pool {
            Some(pool) if jobs.len() > 1 => {
                pool.install(|| jobs.into_par_iter().map(&task).collect::<Vec<_>>())
            }
            _ => jobs.into_iter().map(&task).collect(),
        }));
        outcome.map_err(|payload| TrainError::WorkerPanicked {
            task: name,
            message: panic_message(payload.as_ref()),
        })
    }

    /// Wait until every task submitted so far has finished.
    ///
    /// All phases already block inside [`run_all`](Self::run_all), so this is
    /// an explicit synchronization point for callers that interleave phases.
    pub fn await_all(&self) {
        if let Some(pool) = &self.pool {
            pool.install(|| rayon::broadcast(|_| ()));
        }
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::sequential()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

// =============================================================================
// Slice Utilities
// =============================================================================

/// Split `slice` into consecutive mutable chunks at ascending `bounds`.
///
/// `bounds` has the shape returned by [`TaskRunner::partition`]: it starts at
/// 0, ends at `slice.len()`, and yields `bounds.len() - 1` chunks.
///
/// # Panics
/// Panics if the bounds are not ascending or do not cover the slice.
pub fn split_at_bounds_mut<'a, T>(mut slice: &'a mut [T], bounds: &[usize]) -> Vec<&'a mut [T]> {
    assert_eq!(bounds.first().copied(), Some(0), "bounds must start at 0");
    assert_eq!(bounds.last().copied(), Some(slice.len()), "bounds must end at slice length");

    let mut chunks = Vec::with_capacity(bounds.len().saturating_sub(1));
    for w in bounds.windows(2) {
        let (head, tail) = std::mem::take(&mut slice).split_at_mut(w[1] - w[0]);
        chunks.push(head);
        slice = tail;
    }
    chunks
}
