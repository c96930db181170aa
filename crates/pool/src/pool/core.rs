use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, info};

use crate::error::PoolError;
use crate::task::{Task, TaskResult};

/// Largest task capacity a pool accepts. Both queues preallocate their
/// slots, so this bounds the memory a single pool can claim up front.
pub const MAX_TASK_CAPACITY: usize = 1 << 20;

/// A bounded worker pool in its submission phase.
///
/// Owns a task queue and a result queue, both with capacity
/// `task_capacity`. Tasks are submitted here; [`close_submission`]
/// consumes the pool so nothing can be submitted afterwards.
///
/// [`close_submission`]: WorkerPool::close_submission
pub struct WorkerPool {
    pub(super) worker_count: usize,
    pub(super) task_capacity: usize,
    pub(super) task_tx: Sender<Task>,
    pub(super) task_rx: Receiver<Task>,
    pub(super) result_tx: Sender<TaskResult>,
    pub(super) result_rx: Receiver<TaskResult>,
    /// Tasks accepted so far.
    pub(super) submitted: AtomicU64,
}

impl WorkerPool {
    /// Create a pool that will run `worker_count` workers over at most
    /// `task_capacity` queued tasks.
    pub fn new(worker_count: usize, task_capacity: usize) -> Result<Self, PoolError> {
        if worker_count < 1 {
            return Err(PoolError::InvalidWorkerCount(worker_count));
        }
        if task_capacity > MAX_TASK_CAPACITY {
            return Err(PoolError::CapacityTooLarge {
                requested: task_capacity,
                max: MAX_TASK_CAPACITY,
            });
        }

        let (task_tx, task_rx) = crossbeam_channel::bounded(task_capacity);
        let (result_tx, result_rx) = crossbeam_channel::bounded(task_capacity);

        info!(workers = worker_count, capacity = task_capacity, "worker pool created");

        Ok(Self {
            worker_count,
            task_capacity,
            task_tx,
            task_rx,
            result_tx,
            result_rx,
            submitted: AtomicU64::new(0),
        })
    }

    /// Enqueue a task, blocking while the task queue is at capacity.
    pub fn submit(&self, task: Task) -> Result<(), PoolError> {
        self.task_tx
            .send(task)
            .map_err(|_| PoolError::Disconnected)?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(task_id = task.id, "task submitted");
        Ok(())
    }

    /// Enqueue a task without blocking.
    ///
    /// Fails with [`PoolError::QueueFull`] when the queue is at capacity.
    pub fn try_submit(&self, task: Task) -> Result<(), PoolError> {
        match self.task_tx.try_send(task) {
            Ok(()) => {
                self.submitted.fetch_add(1, Ordering::Relaxed);
                debug!(task_id = task.id, "task submitted");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(PoolError::QueueFull {
                capacity: self.task_capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(PoolError::Disconnected),
        }
    }

    /// Submit every task from `tasks`, in order.
    pub fn submit_all(&self, tasks: impl IntoIterator<Item = Task>) -> Result<(), PoolError> {
        for task in tasks {
            self.submit(task)?;
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn task_capacity(&self) -> usize {
        self.task_capacity
    }

    /// Number of tasks currently waiting in the queue.
    pub fn pending(&self) -> usize {
        self.task_tx.len()
    }

    /// Signal that no further tasks will be submitted.
    pub fn close_submission(self) -> SealedPool {
        let submitted = self.submitted.load(Ordering::Relaxed);
        // Dropping the only sender closes the queue; workers drain what is
        // left and then observe end-of-stream.
        drop(self.task_tx);
        debug!(submitted, "task submission closed");

        SealedPool {
            worker_count: self.worker_count,
            submitted,
            task_rx: self.task_rx,
            result_tx: self.result_tx,
            result_rx: self.result_rx,
        }
    }
}

/// A pool whose task queue is closed and whose workers have not started.
pub struct SealedPool {
    pub(super) worker_count: usize,
    pub(super) submitted: u64,
    pub(super) task_rx: Receiver<Task>,
    pub(super) result_tx: Sender<TaskResult>,
    pub(super) result_rx: Receiver<TaskResult>,
}

impl SealedPool {
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Tasks accepted before submission was closed.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }
}
