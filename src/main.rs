use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use interval_recorder::{PercentileSet, Recorder, RecorderConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod load_generator;
mod reporter;

/// Synthetic latency observatory: workers record simulated operation
/// latencies while a reporter prints one JSON line per interval.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON file holding the recorder configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Significant digits kept when no config file is given
    #[arg(long, default_value_t = 3)]
    significant_figures: u8,
    /// Concurrent load-generator tasks
    #[arg(long, default_value_t = 8)]
    workers: u32,
    /// How long the load runs
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,
    /// Reporting interval
    #[arg(long, default_value_t = 1_000)]
    interval_ms: u64,
    /// Share of operations that are reads, 0 to 100
    #[arg(long, default_value_t = 80)]
    read_pct: u8,
    /// Expected gap between operations in μs; enables coordinated omission
    /// correction
    #[arg(long)]
    expected_interval_us: Option<u64>,
}

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("reading config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Recorder(#[from] interval_recorder::Error),
}

/// Shared state: one recorder per operation kind.
pub struct Observatory {
    pub reads: Recorder,
    pub writes: Recorder,

    /// Cleared by the load generator once every worker has finished.
    pub running: AtomicBool,
}

fn load_config(path: &Path) -> Result<RecorderConfig, Error> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // ── 1. Configure recorders ───────────────────────────────────
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RecorderConfig::with_precision(args.significant_figures),
    };
    let observatory = Arc::new(Observatory {
        reads: Recorder::with_config(config)?,
        writes: Recorder::with_config(config)?,
        running: AtomicBool::new(true),
    });

    // ── 2. Start the load ────────────────────────────────────────
    info!(
        workers = args.workers,
        duration_secs = args.duration_secs,
        read_pct = args.read_pct,
        "starting load"
    );
    let load = tokio::spawn(load_generator::run(
        Arc::clone(&observatory),
        load_generator::LoadSettings {
            workers: args.workers,
            duration: Duration::from_secs(args.duration_secs),
            read_pct: args.read_pct.min(100),
            expected_interval_us: args.expected_interval_us,
        },
    ));

    // ── 3. Report until the load stops ───────────────────────────
    let totals =
        reporter::run(Arc::clone(&observatory), Duration::from_millis(args.interval_ms)).await?;
    if let Err(err) = load.await {
        warn!(%err, "load generator did not finish cleanly");
    }

    // ── 4. Summarize ─────────────────────────────────────────────
    for (kind, total) in [("read", &totals.reads), ("write", &totals.writes)] {
        let summary = PercentileSet::from_accumulator(total);
        info!(
            kind,
            count = summary.count,
            p50_us = summary.p50,
            p99_us = summary.p99,
            max_us = summary.max,
            "run total"
        );
    }

    Ok(())
}
