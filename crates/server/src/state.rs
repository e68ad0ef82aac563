use std::sync::Arc;

use burstrec_core::{MediaEngine, PoolHandle, RecordConfig, RecordTask, WorkerPool};

/// Shared application state
pub struct AppState {
    record_pool: Arc<WorkerPool<RecordTask>>,
    record_config: Arc<RecordConfig>,
    engine: Arc<dyn MediaEngine>,
    pools: Vec<(String, PoolHandle)>,
}

impl AppState {
    pub fn new(
        record_pool: Arc<WorkerPool<RecordTask>>,
        record_config: Arc<RecordConfig>,
        engine: Arc<dyn MediaEngine>,
        pools: Vec<(String, PoolHandle)>,
    ) -> Self {
        Self {
            record_pool,
            record_config,
            engine,
            pools,
        }
    }

    pub fn record_pool(&self) -> &WorkerPool<RecordTask> {
        &self.record_pool
    }

    pub fn record_config(&self) -> Arc<RecordConfig> {
        Arc::clone(&self.record_config)
    }

    pub fn engine(&self) -> Arc<dyn MediaEngine> {
        Arc::clone(&self.engine)
    }

    /// Every registered pool's counter view, for health and metrics.
    pub fn pools(&self) -> &[(String, PoolHandle)] {
        &self.pools
    }
}
