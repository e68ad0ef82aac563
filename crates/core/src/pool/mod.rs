//! Bounded-concurrency task pools.
//!
//! Each pipeline stage runs inside its own [`WorkerPool`]: a fixed set of
//! worker loops pulling from a bounded submission queue and pushing results
//! into a bounded, shared result channel. Submission never blocks; a full
//! queue is reported as [`PoolError::Full`] and is the caller's problem.
//! Writing a result *can* block a worker when the consumer lags, which is
//! the intended back-pressure coupling between a stage and the dispatcher.

mod config;
mod worker;

pub use config::PoolConfig;
pub use worker::{PoolHandle, WorkerPool};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Error type for pool submissions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The submission queue is at capacity.
    #[error("pool is full, unable to add new task")]
    Full,

    /// The pool no longer accepts work.
    #[error("pool is closed, unable to add new task")]
    Closed,
}

/// A unit of work executable by a [`WorkerPool`].
///
/// A task is consumed by its single execution: it may emit any number of
/// results into `results` while it runs, and reports overall success or
/// failure through its return value. Failures are counted by the pool,
/// nothing else happens to them.
#[async_trait]
pub trait Task: Send + 'static {
    /// Value type emitted into the pool's result channel.
    type Output: Send + 'static;

    /// Failure type counted by the pool's error counter.
    type Error: std::error::Error + Send + 'static;

    async fn run(self, results: mpsc::Sender<Self::Output>) -> Result<(), Self::Error>;
}
