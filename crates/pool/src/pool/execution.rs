use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Instant;

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::error::PoolError;
use crate::metrics::PoolMetrics;
use crate::task::{Task, TaskProcessor, TaskResult, WorkerId};

use super::core::SealedPool;

/// Decrements the live-worker count when a worker exits, including by panic.
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl SealedPool {
    /// Spawn `worker_count` workers with ids `0..worker_count`.
    ///
    /// Every worker shares `processor` and loops until the task queue is
    /// closed and empty.
    pub fn start<P: TaskProcessor>(self, processor: P) -> Result<RunningPool, PoolError> {
        let processor = Arc::new(processor);
        let live = Arc::new(AtomicUsize::new(0));
        let metrics = Arc::new(Mutex::new(PoolMetrics {
            tasks_submitted: self.submitted,
            started_at: Some(Utc::now()),
            ..PoolMetrics::default()
        }));

        info!(
            workers = self.worker_count,
            queued = self.submitted,
            "starting workers"
        );

        let started = Instant::now();
        let mut handles = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            let tasks = self.task_rx.clone();
            let results = self.result_tx.clone();
            let processor = Arc::clone(&processor);
            let metrics = Arc::clone(&metrics);
            let guard = LiveGuard(Arc::clone(&live));
            live.fetch_add(1, Ordering::AcqRel);

            let handle = std::thread::Builder::new()
                .name(format!("pool-worker-{worker_id}"))
                .spawn(move || {
                    let _guard = guard;
                    run_worker(worker_id, tasks, results, processor.as_ref(), &metrics);
                })
                .map_err(|source| PoolError::Spawn { worker_id, source })?;
            handles.push(handle);
        }

        Ok(RunningPool {
            handles,
            live,
            metrics,
            started,
            result_tx: self.result_tx,
            result_rx: self.result_rx,
        })
    }
}

/// Worker loop: dequeue, process, publish, until the queue is closed and empty.
fn run_worker<P: TaskProcessor + ?Sized>(
    worker_id: WorkerId,
    tasks: Receiver<Task>,
    results: Sender<TaskResult>,
    processor: &P,
    metrics: &Mutex<PoolMetrics>,
) {
    for task in tasks.iter() {
        info!(worker_id, task_id = task.id, "worker started task");
        let task_start = Instant::now();
        let output = processor.process(&task, worker_id);
        let duration = task_start.elapsed();
        info!(worker_id, task_id = task.id, ?duration, "worker completed task");

        lock_metrics(metrics).record_execution(worker_id, duration);

        let result = TaskResult {
            task_id: task.id,
            worker_id,
            output,
        };
        if results.send(result).is_err() {
            warn!(worker_id, "result queue disconnected, worker exiting early");
            break;
        }
    }
    debug!(worker_id, "worker exiting");
}

/// Metrics are observational, so a poisoned lock is recovered rather than skipped.
fn lock_metrics(metrics: &Mutex<PoolMetrics>) -> MutexGuard<'_, PoolMetrics> {
    match metrics.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A pool whose workers are draining the task queue.
pub struct RunningPool {
    handles: Vec<JoinHandle<()>>,
    live: Arc<AtomicUsize>,
    metrics: Arc<Mutex<PoolMetrics>>,
    started: Instant,
    result_tx: Sender<TaskResult>,
    result_rx: Receiver<TaskResult>,
}

impl RunningPool {
    /// Workers that have not yet terminated.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Block until every worker has terminated.
    ///
    /// Each worker is joined exactly once. A worker that panicked is logged
    /// and counted as terminated.
    pub fn wait(self) -> FinishedPool {
        let mut panicked = 0usize;
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("pool-worker").to_string();
            if handle.join().is_err() {
                panicked += 1;
                error!(worker = %name, "worker panicked");
            }
        }
        debug_assert_eq!(self.live.load(Ordering::Acquire), 0);

        let elapsed = self.started.elapsed();
        let metrics = {
            let mut m = lock_metrics(&self.metrics);
            m.finished_at = Some(Utc::now());
            m.elapsed = elapsed;
            m.clone()
        };

        info!(
            processed = metrics.tasks_processed,
            submitted = metrics.tasks_submitted,
            panicked,
            elapsed_ms = elapsed.as_millis() as u64,
            "all workers finished"
        );

        FinishedPool {
            metrics,
            result_tx: self.result_tx,
            result_rx: self.result_rx,
        }
    }
}

/// A pool whose workers have all terminated.
pub struct FinishedPool {
    pub(super) metrics: PoolMetrics,
    pub(super) result_tx: Sender<TaskResult>,
    pub(super) result_rx: Receiver<TaskResult>,
}

impl FinishedPool {
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poisoned_metrics() -> Mutex<PoolMetrics> {
        let metrics = Mutex::new(PoolMetrics::default());
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = metrics.lock().unwrap();
                    panic!("poison metrics lock");
                })
                .join();
        });
        assert!(metrics.is_poisoned());
        metrics
    }

    #[test]
    fn worker_records_into_poisoned_metrics() {
        let metrics = poisoned_metrics();
        let (task_tx, task_rx) = crossbeam_channel::bounded(2);
        let (result_tx, result_rx) = crossbeam_channel::bounded(2);
        task_tx.send(Task::new(1)).unwrap();
        task_tx.send(Task::new(2)).unwrap();
        drop(task_tx);

        let processor = |task: &Task, _: WorkerId| task.id.to_string();
        run_worker(0, task_rx, result_tx, &processor, &metrics);

        assert_eq!(result_rx.len(), 2);
        let m = lock_metrics(&metrics);
        assert_eq!(m.tasks_processed, 2);
        assert_eq!(m.tasks_per_worker[&0], 2);
    }
}
