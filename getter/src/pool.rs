//! Fixed-size pool of worker threads fed through a bounded queue.
//!
//! # Architecture
//!
//! ```text
//! submit(task) ──► BoundedQueue<Job<T>> ──► worker 0 ─┐
//!                                      ├──► worker 1 ─┼──► TaskHandler::handle
//!                                      └──► worker N ─┘
//! ```
//!
//! Each worker loops pulling jobs until it receives `Job::Stop`. Shutdown
//! pushes one stop per worker behind any queued tasks, so every task
//! submitted before shutdown is handled by exactly one worker before the
//! workers exit.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error};

use crate::queue::{BoundedQueue, QueueError};

/// Errors raised while setting up the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// At least one worker is required.
    #[error("worker pool needs at least one worker")]
    NoWorkers,

    /// The task queue could not be created.
    #[error("could not create task queue: {0}")]
    Queue(#[from] QueueError),

    /// The OS refused to start a worker thread.
    #[error("could not spawn worker thread {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for pool setup.
pub type PoolResult<T> = Result<T, PoolError>;

/// Work performed by the pool for each submitted task.
pub trait TaskHandler<T>: Send + Sync + 'static {
    /// Error produced by a failed task.
    type Error: fmt::Display;

    /// Process one task, returning the number of bytes it produced.
    fn handle(&self, task: T) -> Result<u64, Self::Error>;
}

/// Messages carried by the queue.
enum Job<T> {
    Run(T),
    Stop,
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Default)]
struct PoolStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    bytes: AtomicU64,
}

impl PoolStats {
    fn record_success(&self, bytes: u64) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn summary(&self) -> PoolSummary {
        PoolSummary {
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            bytes: self.bytes.load(Ordering::SeqCst),
        }
    }
}

/// Totals reported when the pool shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    /// Tasks that completed successfully.
    pub completed: usize,
    /// Tasks that failed.
    pub failed: usize,
    /// Bytes produced by successful tasks.
    pub bytes: u64,
}

impl PoolSummary {
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

impl fmt::Display for PoolSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks completed, {} failed, {} bytes written",
            self.completed, self.failed, self.bytes
        )
    }
}

// =============================================================================
// Worker Pool
// =============================================================================

/// A pool of long-lived worker threads.
///
/// Call [`WorkerPool::shutdown`] once all tasks are submitted. Dropping the
/// pool without it performs the same orderly shutdown.
pub struct WorkerPool<T: Send + 'static> {
    queue: Arc<BoundedQueue<Job<T>>>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<PoolStats>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Default queue capacity for `workers` threads.
    pub fn default_queue_capacity(workers: usize) -> usize {
        workers.saturating_mul(2).max(1)
    }

    /// Start `workers` threads sharing `handler`.
    pub fn spawn<H>(workers: usize, queue_capacity: usize, handler: H) -> PoolResult<Self>
    where
        H: TaskHandler<T>,
    {
        if workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let mut pool = Self {
            queue: Arc::new(BoundedQueue::new(queue_capacity)?),
            workers: Vec::with_capacity(workers),
            stats: Arc::new(PoolStats::default()),
        };
        let handler = Arc::new(handler);

        for index in 0..workers {
            let queue = Arc::clone(&pool.queue);
            let handler = Arc::clone(&handler);
            let stats = Arc::clone(&pool.stats);

            // On error the partially built pool is dropped, which stops the
            // workers already running.
            let handle = thread::Builder::new()
                .name(format!("getter-worker-{}", index))
                .spawn(move || run_worker(index, &queue, handler.as_ref(), &stats))
                .map_err(|source| PoolError::Spawn { index, source })?;
            pool.workers.push(handle);
        }

        debug!(workers, queue_capacity, "Worker pool started");
        Ok(pool)
    }

    /// Queue a task, blocking while the queue is full.
    pub fn submit(&self, task: T) {
        self.queue.put(Job::Run(task));
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Totals so far.
    pub fn summary(&self) -> PoolSummary {
        self.stats.summary()
    }

    /// Let queued tasks drain, stop every worker and join them.
    pub fn shutdown(mut self) -> PoolSummary {
        self.stop_workers();
        self.stats.summary()
    }

    fn stop_workers(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        for _ in 0..self.workers.len() {
            self.queue.put(Job::Stop);
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("Worker thread panicked");
            }
        }
        debug!(summary = %self.stats.summary(), "Worker pool stopped");
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

fn run_worker<T, H>(index: usize, queue: &BoundedQueue<Job<T>>, handler: &H, stats: &PoolStats)
where
    H: TaskHandler<T>,
{
    debug!(worker = index, "Worker started");

    loop {
        let task = match queue.get() {
            Job::Run(task) => task,
            Job::Stop => break,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(task))) {
            Ok(Ok(bytes)) => stats.record_success(bytes),
            Ok(Err(e)) => {
                debug!(worker = index, error = %e, "Task failed");
                stats.record_failure();
            }
            Err(_) => {
                error!(worker = index, "Task handler panicked");
                stats.record_failure();
            }
        }
    }

    debug!(worker = index, "Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Records every task it sees; fails odd tasks when asked to.
    struct Recorder {
        seen: Arc<Mutex<Vec<u32>>>,
        fail_odd: bool,
    }

    impl TaskHandler<u32> for Recorder {
        type Error = String;

        fn handle(&self, task: u32) -> Result<u64, String> {
            self.seen.lock().push(task);
            if self.fail_odd && task % 2 == 1 {
                Err(format!("task {} failed", task))
            } else {
                Ok(u64::from(task))
            }
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let result = WorkerPool::<u32>::spawn(
            0,
            4,
            Recorder {
                seen,
                fail_odd: false,
            },
        );
        assert!(matches!(result, Err(PoolError::NoWorkers)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let result = WorkerPool::<u32>::spawn(
            2,
            0,
            Recorder {
                seen,
                fail_odd: false,
            },
        );
        assert!(matches!(
            result,
            Err(PoolError::Queue(QueueError::ZeroCapacity))
        ));
    }

    #[test]
    fn test_default_queue_capacity() {
        assert_eq!(WorkerPool::<u32>::default_queue_capacity(4), 8);
        assert_eq!(WorkerPool::<u32>::default_queue_capacity(0), 1);
    }

    #[test]
    fn test_all_tasks_drained_before_shutdown() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pool = WorkerPool::<u32>::spawn(
            4,
            8,
            Recorder {
                seen: Arc::clone(&seen),
                fail_odd: false,
            },
        )
        .unwrap();
        assert_eq!(pool.worker_count(), 4);

        for task in 0..200 {
            pool.submit(task);
        }
        let summary = pool.shutdown();

        let seen = seen.lock();
        assert_eq!(seen.len(), 200);
        let unique: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(unique.len(), 200, "each task handled exactly once");

        assert_eq!(summary.completed, 200);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.bytes, (0..200u64).sum::<u64>());
    }

    #[test]
    fn test_failures_counted() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pool = WorkerPool::<u32>::spawn(
            2,
            2,
            Recorder {
                seen,
                fail_odd: true,
            },
        )
        .unwrap();

        for task in 0..10 {
            pool.submit(task);
        }
        let summary = pool.shutdown();
        assert_eq!(summary.completed, 5);
        assert_eq!(summary.failed, 5);
        assert_eq!(summary.total(), 10);
        assert_eq!(summary.bytes, 2 + 4 + 6 + 8);
    }

    struct Panicker;

    impl TaskHandler<u32> for Panicker {
        type Error = String;

        fn handle(&self, task: u32) -> Result<u64, String> {
            if task == 0 {
                panic!("boom");
            }
            Ok(1)
        }
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let pool = WorkerPool::<u32>::spawn(1, 1, Panicker).unwrap();
        for task in 0..3 {
            pool.submit(task);
        }
        let summary = pool.shutdown();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed, 2);
    }

    struct Slow;

    impl TaskHandler<u32> for Slow {
        type Error = String;

        fn handle(&self, _task: u32) -> Result<u64, String> {
            thread::sleep(Duration::from_millis(5));
            Ok(1)
        }
    }

    #[test]
    fn test_drop_drains_queue() {
        let pool = WorkerPool::<u32>::spawn(2, 2, Slow).unwrap();
        for task in 0..6 {
            pool.submit(task);
        }
        let stats = Arc::clone(&pool.stats);
        drop(pool);
        assert_eq!(stats.summary().completed, 6);
    }

    #[test]
    fn test_summary_display() {
        let summary = PoolSummary {
            completed: 3,
            failed: 1,
            bytes: 300,
        };
        assert_eq!(
            summary.to_string(),
            "3 tasks completed, 1 failed, 300 bytes written"
        );
    }
}
