//! Prometheus metrics for the working pools.
//!
//! Three gauges, labelled by pool name, mirror each pool's live counters.
//! A sampler task snapshots every registered pool on a fixed interval;
//! reads are concurrent with worker mutation and eventually consistent.

use once_cell::sync::Lazy;
use prometheus::{IntGaugeVec, Opts};
use std::time::Duration;
use tracing::info;

use crate::pool::PoolHandle;

/// How often the sampler snapshots the pools.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Total number of failed tasks per working pool.
pub static POOL_ERRORS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "burstrec_pool_errors_total",
            "Total number of failed tasks for the working pool",
        ),
        &["pool"],
    )
    .unwrap()
});

/// Number of currently running tasks per working pool.
pub static POOL_TASKS_IN_PROGRESS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "burstrec_pool_tasks_in_progress",
            "Number of currently running tasks",
        ),
        &["pool"],
    )
    .unwrap()
});

/// Number of queued tasks per working pool.
pub static POOL_WORK_BACKLOG: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "burstrec_pool_work_backlog",
            "Number of tasks waiting in the working pool",
        ),
        &["pool"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(POOL_ERRORS.clone()),
        Box::new(POOL_TASKS_IN_PROGRESS.clone()),
        Box::new(POOL_WORK_BACKLOG.clone()),
    ]
}

/// Snapshots every pool's counters into the gauges.
pub fn sample(pools: &[(String, PoolHandle)]) {
    for (name, handle) in pools {
        POOL_ERRORS
            .with_label_values(&[name.as_str()])
            .set(handle.errors() as i64);
        POOL_TASKS_IN_PROGRESS
            .with_label_values(&[name.as_str()])
            .set(handle.in_progress() as i64);
        POOL_WORK_BACKLOG
            .with_label_values(&[name.as_str()])
            .set(handle.backlog() as i64);
    }
}

/// Spawns the periodic sampler task.
pub fn spawn_sampler(
    pools: Vec<(String, PoolHandle)>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting metrics sampler");
        loop {
            sample(&pools);
            tokio::time::sleep(interval).await;
        }
    })
}
