use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PoolError;
use crate::pool::MAX_TASK_CAPACITY;

/// Longest simulated per-task delay accepted by [`PoolConfig::validate`].
const MAX_TASK_DELAY_MS: u64 = 60 * 60 * 1000;

/// Largest task count accepted by [`PoolConfig::validate`]. Queue capacity is
/// sized to the task count, so this matches the pool's capacity limit.
const MAX_TASK_COUNT: u64 = MAX_TASK_CAPACITY as u64;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Worker pool run configuration, typically parsed from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker threads. 0 = available parallelism.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Number of tasks to generate (ids `1..=task_count`).
    #[serde(default = "default_task_count")]
    pub task_count: u64,
    /// Simulated processing delay per task, in milliseconds.
    #[serde(default = "default_task_delay_ms")]
    pub task_delay_ms: u64,
    /// File the runner writes results to. Printed to stdout when unset.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

fn default_worker_count() -> usize { 4 }
fn default_task_count() -> u64 { 10 }
fn default_task_delay_ms() -> u64 { 300 }

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            task_count: default_task_count(),
            task_delay_ms: default_task_delay_ms(),
            output_path: None,
        }
    }
}

impl PoolConfig {
    /// Parse config from a TOML string, then apply env overrides.
    pub fn from_toml(toml_str: &str) -> Result<Self, PoolError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PoolError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Defaults plus env overrides (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, PoolError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `POOL_*` environment variables.
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Unparseable numeric values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(n) = lookup("POOL_WORKERS").and_then(|v| v.parse().ok()) {
            self.worker_count = n;
        }
        if let Some(n) = lookup("POOL_TASKS").and_then(|v| v.parse().ok()) {
            self.task_count = n;
        }
        if let Some(ms) = lookup("POOL_TASK_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.task_delay_ms = ms;
        }
        if let Some(path) = lookup("POOL_OUTPUT").filter(|v| !v.is_empty()) {
            self.output_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.task_count > MAX_TASK_COUNT {
            return Err(PoolError::Config(format!(
                "task_count {} exceeds the limit of {}",
                self.task_count, MAX_TASK_COUNT
            )));
        }
        if self.task_delay_ms > MAX_TASK_DELAY_MS {
            return Err(PoolError::Config(format!(
                "task_delay_ms {} exceeds the {}ms limit",
                self.task_delay_ms, MAX_TASK_DELAY_MS
            )));
        }
        Ok(())
    }

    /// Resolve worker count (0 means use available parallelism).
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_count
        }
    }

    /// Task queue capacity, sized to the known task count.
    pub fn task_capacity(&self) -> Result<usize, PoolError> {
        usize::try_from(self.task_count).map_err(|_| {
            PoolError::Config(format!(
                "task_count {} does not fit in this platform's usize",
                self.task_count
            ))
        })
    }

    pub fn task_delay(&self) -> Duration {
        Duration::from_millis(self.task_delay_ms)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            workers = self.resolved_worker_count(),
            tasks = self.task_count,
            delay_ms = self.task_delay_ms,
            output = ?self.output_path,
            "pool config loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.task_count, 10);
        assert_eq!(config.task_delay_ms, 300);
        assert!(config.output_path.is_none());
        assert_eq!(config.task_capacity().unwrap(), 10);
        assert_eq!(config.task_delay(), Duration::from_millis(300));
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: PoolConfig = toml::from_str("worker_count = 8\n").unwrap();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.task_count, 10);
        assert_eq!(config.task_delay_ms, 300);
    }

    #[test]
    fn parse_full_toml() {
        let config: PoolConfig = toml::from_str(
            r#"
            worker_count = 2
            task_count = 50
            task_delay_ms = 0
            output_path = "results.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.task_count, 50);
        assert_eq!(config.task_delay_ms, 0);
        assert_eq!(config.output_path, Some(PathBuf::from("results.txt")));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err: Result<PoolConfig, _> = toml::from_str("worker_count = \"many\"");
        assert!(err.is_err());
    }

    #[test]
    fn overrides_replace_fields() {
        let env: HashMap<&str, &str> = [
            ("POOL_WORKERS", "6"),
            ("POOL_TASKS", "25"),
            ("POOL_TASK_DELAY_MS", "5"),
            ("POOL_OUTPUT", "out.txt"),
        ]
        .into_iter()
        .collect();

        let mut config = PoolConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.worker_count, 6);
        assert_eq!(config.task_count, 25);
        assert_eq!(config.task_delay_ms, 5);
        assert_eq!(config.output_path, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn unparseable_overrides_are_ignored() {
        let mut config = PoolConfig::default();
        config.apply_overrides(|key| match key {
            "POOL_WORKERS" => Some("lots".to_string()),
            "POOL_OUTPUT" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config, PoolConfig::default());
    }

    #[test]
    fn validate_rejects_huge_delay() {
        let config = PoolConfig {
            task_delay_ms: MAX_TASK_DELAY_MS + 1,
            ..PoolConfig::default()
        };
        assert!(matches!(config.validate(), Err(PoolError::Config(_))));
    }

    #[test]
    fn validate_rejects_huge_task_count() {
        let config = PoolConfig {
            task_count: u64::MAX,
            ..PoolConfig::default()
        };
        assert!(matches!(config.validate(), Err(PoolError::Config(_))));

        let at_limit = PoolConfig {
            task_count: MAX_TASK_COUNT,
            ..PoolConfig::default()
        };
        assert!(at_limit.validate().is_ok());
        assert_eq!(at_limit.task_capacity().unwrap(), MAX_TASK_CAPACITY);
    }

    #[test]
    fn resolved_worker_count() {
        let mut config = PoolConfig::default();
        config.worker_count = 0;
        // 0 means auto-detect
        assert!(config.resolved_worker_count() > 0);

        config.worker_count = 8;
        assert_eq!(config.resolved_worker_count(), 8);
    }
}
