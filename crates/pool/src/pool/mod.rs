//! Bounded worker pool: a fixed set of workers drains a shared task queue
//! and publishes one result per task to a shared result queue.
//!
//! The lifecycle is a chain of owned phases, each consuming the last:
//! - `core`: [`WorkerPool`] (construction + submission) and [`SealedPool`]
//! - `execution`: worker spawn, the worker loop, and the completion barrier
//! - `results`: closing and draining the result queue

mod core;
mod execution;
mod results;

pub use self::core::{MAX_TASK_CAPACITY, SealedPool, WorkerPool};
pub use self::execution::{FinishedPool, RunningPool};
pub use self::results::{Drain, ResultSet};

use crate::error::PoolError;
use crate::task::{Task, TaskProcessor};

/// Run `tasks` through a pool of `worker_count` workers and return the
/// closed result set.
///
/// Capacity is sized to the number of tasks, so submission never blocks.
pub fn run_tasks<P: TaskProcessor>(
    worker_count: usize,
    tasks: Vec<Task>,
    processor: P,
) -> Result<ResultSet, PoolError> {
    let pool = WorkerPool::new(worker_count, tasks.len())?;
    pool.submit_all(tasks)?;
    let running = pool.close_submission().start(processor)?;
    Ok(running.wait().close_results())
}
