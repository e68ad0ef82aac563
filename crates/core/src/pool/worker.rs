//! Worker pool implementation.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::warn;

use super::{PoolConfig, PoolError, Task};

/// Cheaply cloneable view of a pool's live counters.
///
/// Reads are concurrent with worker mutation and therefore
/// eventually-consistent snapshots, not transactionally exact values.
#[derive(Debug, Clone, Default)]
pub struct PoolHandle {
    errors: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    backlog: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
}

impl PoolHandle {
    /// Number of tasks that reported failure (or panicked) so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of tasks currently executing.
    pub fn in_progress(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Number of tasks waiting in the submission queue.
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Relaxed)
    }

    /// True while at least one worker loop is alive.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// A bounded-concurrency executor for one pipeline stage.
///
/// Construction spawns the worker loops (if any) and hands back the single
/// consumer end of the result channel.
pub struct WorkerPool<T: Task> {
    name: String,
    queue_tx: mpsc::Sender<T>,
    handle: PoolHandle,
    shutdown_tx: broadcast::Sender<()>,
    // Keeps a zero-worker pool's queue open so submissions still enqueue.
    _parked_queue: Option<mpsc::Receiver<T>>,
}

impl<T: Task> WorkerPool<T> {
    /// Creates the pool and starts `config.workers` worker loops.
    pub fn new(name: impl Into<String>, config: PoolConfig) -> (Self, mpsc::Receiver<T::Output>) {
        let name = name.into();
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_size.max(1));
        let (result_tx, result_rx) = mpsc::channel(config.result_size.max(1));
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = PoolHandle::default();

        let parked_queue = if config.workers > 0 {
            handle.running.store(true, Ordering::SeqCst);
            let queue_rx = Arc::new(Mutex::new(queue_rx));
            let mut workers = Vec::with_capacity(config.workers);
            for _ in 0..config.workers {
                workers.push(tokio::spawn(worker_loop::<T>(
                    name.clone(),
                    Arc::clone(&queue_rx),
                    result_tx.clone(),
                    handle.clone(),
                    shutdown_tx.subscribe(),
                )));
            }
            // The running flag drops only once every worker loop has exited.
            let running = Arc::clone(&handle.running);
            tokio::spawn(async move {
                for worker in workers {
                    let _ = worker.await;
                }
                running.store(false, Ordering::SeqCst);
            });
            None
        } else {
            Some(queue_rx)
        };

        (
            Self {
                name,
                queue_tx,
                handle,
                shutdown_tx,
                _parked_queue: parked_queue,
            },
            result_rx,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempts to enqueue a task without blocking.
    pub fn execute(&self, task: T) -> Result<(), PoolError> {
        // Counted before the send so a worker's decrement can never observe
        // the queue entry ahead of the increment.
        self.handle.backlog.fetch_add(1, Ordering::Relaxed);
        match self.queue_tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.handle.backlog.fetch_sub(1, Ordering::Relaxed);
                Err(PoolError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.handle.backlog.fetch_sub(1, Ordering::Relaxed);
                Err(PoolError::Closed)
            }
        }
    }

    /// True while at least one worker loop is alive.
    pub fn running(&self) -> bool {
        self.handle.running()
    }

    pub fn errors(&self) -> u64 {
        self.handle.errors()
    }

    pub fn in_progress(&self) -> usize {
        self.handle.in_progress()
    }

    pub fn backlog(&self) -> usize {
        self.handle.backlog()
    }

    /// Counter view for health checks and the metrics sampler.
    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    /// Halts dispatch of new tasks. In-flight tasks are not cancelled.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn worker_loop<T: Task>(
    pool: String,
    queue: Arc<Mutex<mpsc::Receiver<T>>>,
    results: mpsc::Sender<T::Output>,
    handle: PoolHandle,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let task = {
            let mut queue = queue.lock().await;
            tokio::select! {
                _ = shutdown.recv() => break,
                task = queue.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            }
        };
        handle.backlog.fetch_sub(1, Ordering::Relaxed);
        handle.in_flight.fetch_add(1, Ordering::Relaxed);

        // A task runs in its own spawned task so a panic costs one task,
        // not the worker slot.
        let results_tx = results.clone();
        let outcome = tokio::spawn(async move { task.run(results_tx).await }).await;

        handle.in_flight.fetch_sub(1, Ordering::Relaxed);
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                handle.errors.fetch_add(1, Ordering::Relaxed);
                warn!(pool = %pool, error = %e, "task failed");
            }
            Err(e) => {
                handle.errors.fetch_add(1, Ordering::Relaxed);
                warn!(pool = %pool, error = %e, "task aborted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use thiserror::Error;
    use tokio::time::sleep;

    #[derive(Debug, Error)]
    #[error("test task failure")]
    struct TestTaskError;

    struct TestTask {
        sleep_ms: u64,
        should_fail: bool,
        emit: Option<u32>,
        panic: bool,
    }

    impl TestTask {
        fn quick() -> Self {
            Self {
                sleep_ms: 0,
                should_fail: false,
                emit: None,
                panic: false,
            }
        }

        fn emitting(value: u32) -> Self {
            Self {
                emit: Some(value),
                ..Self::quick()
            }
        }

        fn failing() -> Self {
            Self {
                should_fail: true,
                ..Self::quick()
            }
        }

        fn slow(ms: u64) -> Self {
            Self {
                sleep_ms: ms,
                ..Self::quick()
            }
        }

        fn panicking() -> Self {
            Self {
                panic: true,
                ..Self::quick()
            }
        }
    }

    #[async_trait]
    impl Task for TestTask {
        type Output = u32;
        type Error = TestTaskError;

        async fn run(self, results: mpsc::Sender<u32>) -> Result<(), TestTaskError> {
            if self.sleep_ms > 0 {
                sleep(Duration::from_millis(self.sleep_ms)).await;
            }
            if self.panic {
                panic!("test task panic");
            }
            if let Some(value) = self.emit {
                let _ = results.send(value).await;
            }
            if self.should_fail {
                return Err(TestTaskError);
            }
            Ok(())
        }
    }

    async fn wait_until(mut probe: impl FnMut() -> bool) {
        for _ in 0..200 {
            if probe() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    fn config(workers: usize, queue_size: usize, result_size: usize) -> PoolConfig {
        PoolConfig {
            workers,
            queue_size,
            result_size,
        }
    }

    #[tokio::test]
    async fn test_zero_worker_pool_is_not_running() {
        let (pool, _results) = WorkerPool::<TestTask>::new("idle", config(0, 10, 10));
        assert!(!pool.running());
        assert_eq!(pool.errors(), 0);
        assert_eq!(pool.in_progress(), 0);
        assert_eq!(pool.backlog(), 0);
    }

    #[tokio::test]
    async fn test_pool_with_workers_is_running() {
        let (pool, _results) = WorkerPool::<TestTask>::new("busy", config(5, 10, 10));
        assert!(pool.running());
    }

    #[tokio::test]
    async fn test_zero_worker_pool_accepts_up_to_capacity() {
        let (pool, _results) = WorkerPool::<TestTask>::new("idle", config(0, 3, 10));

        pool.execute(TestTask::quick()).unwrap();
        pool.execute(TestTask::quick()).unwrap();
        pool.execute(TestTask::quick()).unwrap();
        assert_eq!(pool.backlog(), 3);

        let err = pool.execute(TestTask::quick()).unwrap_err();
        assert_eq!(err, PoolError::Full);
        assert_eq!(err.to_string(), "pool is full, unable to add new task");
        assert_eq!(pool.backlog(), 3);
    }

    #[tokio::test]
    async fn test_results_are_delivered() {
        let (pool, mut results) = WorkerPool::<TestTask>::new("emit", config(3, 10, 10));

        pool.execute(TestTask::emitting(1)).unwrap();
        pool.execute(TestTask::emitting(2)).unwrap();

        let mut received = vec![
            results.recv().await.unwrap(),
            results.recv().await.unwrap(),
        ];
        received.sort_unstable();
        assert_eq!(received, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failed_task_increments_errors() {
        let (pool, _results) = WorkerPool::<TestTask>::new("errors", config(2, 10, 10));

        pool.execute(TestTask::failing()).unwrap();
        pool.execute(TestTask::quick()).unwrap();

        wait_until(|| pool.errors() == 1 && pool.in_progress() == 0).await;
        assert_eq!(pool.errors(), 1);
    }

    #[tokio::test]
    async fn test_in_progress_tracks_running_tasks() {
        let (pool, _results) = WorkerPool::<TestTask>::new("progress", config(3, 10, 10));

        pool.execute(TestTask::slow(200)).unwrap();
        pool.execute(TestTask::slow(200)).unwrap();

        wait_until(|| pool.in_progress() == 2).await;
        wait_until(|| pool.in_progress() == 0).await;
    }

    #[tokio::test]
    async fn test_backlog_drains_into_workers() {
        let (pool, _results) = WorkerPool::<TestTask>::new("backlog", config(1, 10, 10));

        pool.execute(TestTask::slow(200)).unwrap();
        pool.execute(TestTask::slow(200)).unwrap();
        pool.execute(TestTask::slow(200)).unwrap();

        // One task in flight, two waiting.
        wait_until(|| pool.in_progress() == 1 && pool.backlog() == 2).await;
        wait_until(|| pool.backlog() == 0 && pool.in_progress() == 0).await;
    }

    #[tokio::test]
    async fn test_stop_halts_dispatch() {
        let (pool, _results) = WorkerPool::<TestTask>::new("stop", config(5, 10, 10));
        assert!(pool.running());

        pool.stop();
        wait_until(|| !pool.running()).await;
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_kill_worker() {
        let (pool, mut results) = WorkerPool::<TestTask>::new("panic", config(1, 10, 10));

        pool.execute(TestTask::panicking()).unwrap();
        pool.execute(TestTask::emitting(7)).unwrap();

        // The single worker survives the panic and serves the next task.
        assert_eq!(results.recv().await.unwrap(), 7);
        assert_eq!(pool.errors(), 1);
        assert!(pool.running());
    }
}
