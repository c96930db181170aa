use crossbeam_channel::Receiver;
use tracing::debug;

use crate::metrics::PoolMetrics;
use crate::task::TaskResult;

use super::execution::FinishedPool;

impl FinishedPool {
    /// Signal that no further results will be published.
    pub fn close_results(self) -> ResultSet {
        drop(self.result_tx);
        debug!(results = self.result_rx.len(), "result queue closed");
        ResultSet {
            results: self.result_rx,
            metrics: self.metrics,
        }
    }
}

/// The closed result queue of a finished pool run.
///
/// Results come out in arrival order. Each is yielded exactly once across
/// all calls to [`drain`](ResultSet::drain).
pub struct ResultSet {
    results: Receiver<TaskResult>,
    metrics: PoolMetrics,
}

impl ResultSet {
    /// Results not yet drained.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Iterate over the remaining results, consuming them.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain {
            inner: self.results.iter(),
        }
    }

    /// Collect the remaining results.
    pub fn into_vec(mut self) -> Vec<TaskResult> {
        self.drain().collect()
    }
}

/// One-shot iterator over a [`ResultSet`].
///
/// Every sender is gone by the time a `ResultSet` exists, so this never
/// blocks and ends once the queue is empty.
pub struct Drain<'a> {
    inner: crossbeam_channel::Iter<'a, TaskResult>,
}

impl Iterator for Drain<'_> {
    type Item = TaskResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
