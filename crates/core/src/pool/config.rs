/// Sizing options for a [`super::WorkerPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker loops. 0 means the pool accepts submissions but
    /// never executes them.
    pub workers: usize,
    /// Capacity of the submission queue.
    pub queue_size: usize,
    /// Capacity of the result channel.
    pub result_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_size: 100,
            result_size: 100,
        }
    }
}
