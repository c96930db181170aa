//! pool-runner — drive a bounded worker pool over a generated task set.
//!
//! Generates tasks `1..=N`, runs them through `W` workers with a fixed
//! simulated delay, then prints or writes the results once every worker
//! has finished.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{error, info};

use stupid_pool::config::load_dotenv;
use stupid_pool::{PoolConfig, PoolMetrics, SimulatedWork, Task, TaskResult, WorkerPool};

// ── CLI ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

/// Run a fixed set of simulated tasks through a bounded worker pool.
#[derive(Parser, Debug)]
#[command(name = "pool-runner", version, about)]
struct Cli {
    /// Path to a TOML pool config file.
    #[arg(long, env = "POOL_CONFIG")]
    config: Option<String>,

    /// Number of workers (overrides config; 0 = available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// Number of tasks to generate (overrides config).
    #[arg(long)]
    tasks: Option<u64>,

    /// Simulated per-task delay in milliseconds (overrides config).
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Write results to this file instead of stdout.
    #[arg(long)]
    output: Option<String>,

    /// Result output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,
}

impl Cli {
    fn resolve_config(&self) -> Result<PoolConfig> {
        let mut config = match &self.config {
            Some(path) => PoolConfig::from_file(path)
                .with_context(|| format!("failed to load pool config: {path}"))?,
            None => PoolConfig::from_env().context("invalid pool config from environment")?,
        };

        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(tasks) = self.tasks {
            config.task_count = tasks;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.task_delay_ms = delay_ms;
        }
        if let Some(output) = &self.output {
            config.output_path = Some(output.into());
        }

        config.validate().context("invalid pool config")?;
        Ok(config)
    }
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Report<'a> {
    results: &'a [TaskResult],
    metrics: &'a PoolMetrics,
}

fn render(
    out: &mut impl Write,
    format: OutputFormat,
    results: &[TaskResult],
    metrics: &PoolMetrics,
) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            writeln!(out, "Final Results:")?;
            for result in results {
                writeln!(out, "{}", result.output)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &Report { results, metrics })?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn write_to_file(
    path: &Path,
    format: OutputFormat,
    results: &[TaskResult],
    metrics: &PoolMetrics,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    render(&mut BufWriter::new(file), format, results, metrics)
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    config.log_summary();

    let capacity = config.task_capacity().context("invalid task count")?;
    let pool = WorkerPool::new(config.resolved_worker_count(), capacity)
        .context("failed to create worker pool")?;
    pool.submit_all((1..=config.task_count).map(Task::new))
        .context("failed to submit tasks")?;

    let running = pool
        .close_submission()
        .start(SimulatedWork::new(config.task_delay()))
        .context("failed to start workers")?;
    let mut result_set = running.wait().close_results();

    let metrics = result_set.metrics().clone();
    let results: Vec<TaskResult> = result_set.drain().collect();

    match &config.output_path {
        Some(path) => match write_to_file(path, cli.format, &results, &metrics) {
            Ok(()) => info!(path = %path.display(), count = results.len(), "results written"),
            Err(e) => {
                error!(error = %e, "could not write results file, printing instead");
                render(&mut std::io::stdout().lock(), cli.format, &results, &metrics)?;
            }
        },
        None => render(&mut std::io::stdout().lock(), cli.format, &results, &metrics)?,
    }

    Ok(())
}
