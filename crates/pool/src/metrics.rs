use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::WorkerId;

/// Operational metrics for one pool run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolMetrics {
    /// Tasks accepted into the task queue.
    pub tasks_submitted: u64,
    /// Tasks that produced a result.
    pub tasks_processed: u64,
    /// Processed task count by worker id.
    pub tasks_per_worker: BTreeMap<WorkerId, u64>,
    /// Mean processor time per task.
    pub avg_task_duration: Duration,
    /// When workers were started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the last worker terminated.
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock time from start to the last worker terminating.
    pub elapsed: Duration,
}

impl PoolMetrics {
    /// Record one processed task.
    pub fn record_execution(&mut self, worker_id: WorkerId, duration: Duration) {
        self.tasks_processed += 1;
        *self.tasks_per_worker.entry(worker_id).or_default() += 1;

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let count = self.tasks_processed;
        self.avg_task_duration = if count == 1 {
            duration
        } else {
            let prev_nanos = self.avg_task_duration.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }

    /// Number of distinct workers that processed at least one task.
    pub fn active_workers(&self) -> usize {
        self.tasks_per_worker.len()
    }
}
