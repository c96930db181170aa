pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod task;

pub use config::PoolConfig;
pub use error::PoolError;
pub use metrics::PoolMetrics;
pub use pool::{
    Drain, FinishedPool, MAX_TASK_CAPACITY, ResultSet, RunningPool, SealedPool, WorkerPool, run_tasks,
};
pub use task::{SimulatedWork, Task, TaskProcessor, TaskResult, WorkerId};
