use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Zero-based index assigned to a worker when the pool spawns it.
pub type WorkerId = usize;

/// A discrete unit of work, identified by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
}

impl Task {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// Outcome of processing one [`Task`], tagged with the worker that ran it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Id of the task that produced this result.
    pub task_id: u64,
    /// Worker that processed the task.
    pub worker_id: WorkerId,
    /// Processor output.
    pub output: String,
}

/// The work a pool worker performs for each task it dequeues.
///
/// Processing never fails: every task yields exactly one output string.
/// Implementations are shared by all workers of a pool.
pub trait TaskProcessor: Send + Sync + 'static {
    fn process(&self, task: &Task, worker_id: WorkerId) -> String;
}

impl<F> TaskProcessor for F
where
    F: Fn(&Task, WorkerId) -> String + Send + Sync + 'static,
{
    fn process(&self, task: &Task, worker_id: WorkerId) -> String {
        self(task, worker_id)
    }
}

/// Fixed-delay simulated work.
///
/// Sleeps for `delay`, then reports which worker handled the task.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedWork {
    pub delay: Duration,
}

impl SimulatedWork {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedWork {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(300),
        }
    }
}

impl TaskProcessor for SimulatedWork {
    fn process(&self, task: &Task, worker_id: WorkerId) -> String {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        format!("Result of Task-{} by Worker-{}", task.id, worker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_work_output_format() {
        let work = SimulatedWork::new(Duration::ZERO);
        assert_eq!(work.process(&Task::new(7), 2), "Result of Task-7 by Worker-2");
    }

    #[test]
    fn simulated_work_default_delay() {
        assert_eq!(SimulatedWork::default().delay, Duration::from_millis(300));
    }

    #[test]
    fn closure_processor() {
        let processor = |task: &Task, worker: WorkerId| format!("{}:{}", task.id, worker);
        assert_eq!(processor.process(&Task::new(3), 1), "3:1");
    }

    #[test]
    fn task_result_serializes() {
        let result = TaskResult {
            task_id: 1,
            worker_id: 0,
            output: "done".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["task_id"], 1);
        assert_eq!(json["worker_id"], 0);
        assert_eq!(json["output"], "done");
    }
}
