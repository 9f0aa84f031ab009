//! Order preserving parallel map.
//!
//! Estimation code never spawns threads itself. It receives something that
//! implements [`ParallelMap`] and submits one independent task per item; the
//! results come back in submission order no matter which task finished first.
use crate::error::Result;
use getset::CopyGetters;
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Capability of mapping a function over a batch of independent items.
pub trait ParallelMap: Sync {
    /// Apply `f` to every item and return results in input order. Blocks
    /// until the whole batch is done.
    fn parallel_map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Sync + Send;
}

/// Runs every task on the calling thread. Used in tests and for tiny batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl ParallelMap for Sequential {
    fn parallel_map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Sync + Send,
    {
        items.into_iter().map(f).collect()
    }
}

/// A bounded pool of worker threads.
#[derive(Debug, CopyGetters)]
pub struct WorkerPool {
    #[getset(get_copy = "pub")]
    workers: usize,
    pool: ThreadPool,
}

impl WorkerPool {
    /// Create a pool with the given number of threads (at least one).
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        debug!("started worker pool with {} threads", workers);
        Ok(WorkerPool { workers, pool })
    }
}

impl ParallelMap for WorkerPool {
    fn parallel_map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Sync + Send,
    {
        self.pool
            .install(|| items.into_par_iter().map(|item| f(item)).collect())
    }
}

impl<P: ParallelMap> ParallelMap for &P {
    fn parallel_map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Sync + Send,
    {
        (**self).parallel_map(items, f)
    }
}
