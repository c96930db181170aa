use thiserror::Error;

/// Errors surfaced by the worker pool and its configuration layer.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("task capacity {requested} exceeds the limit of {max}")]
    CapacityTooLarge { requested: usize, max: usize },

    #[error("task queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("task queue disconnected")]
    Disconnected,

    #[error("failed to spawn worker {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
}
