//! CrossTrend CLI: pipeline, backfill, and offline analysis commands.
//!
//! Commands:
//! - `run`: one incremental pipeline pass
//! - `watch`: run now, then on the 4h schedule
//! - `backfill`: seed an empty history store from the bar file
//! - `indicators`: enrich a CSV of bars and print the stored-record JSON
//! - `scan`: enrich a CSV of bars and print events from a reference bar
//! - `synthetic`: write a random-walk bar file
//! - `error-codes`: list the error-code taxonomy

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crosstrend_core::engine::IndicatorEngine;
use crosstrend_core::fingerprint::{hash_config, hash_rows};
use crosstrend_core::schema::StoredRecord;
use crosstrend_core::signals::SignalDetector;
use crosstrend_core::synthetic::{random_walk, SyntheticConfig};
use crosstrend_runner::source::{parse_bar_timestamp, read_csv, write_csv};
use crosstrend_runner::{run_scheduled, taxonomy, Pipeline, PipelineConfig, SingleFlight};

#[derive(Parser)]
#[command(
    name = "crosstrend",
    about = "CrossTrend: 4h indicator enrichment and signal alerts"
)]
struct Cli {
    /// Pipeline config (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One incremental pipeline pass.
    Run {
        /// Treat this instant as now (RFC 3339 or `YYYY-MM-DD HH:MM:SS`).
        #[arg(long)]
        now: Option<String>,
    },
    /// Run now, then at every scheduled time.
    Watch {
        /// Stop after this many runs.
        #[arg(long)]
        max_runs: Option<usize>,
    },
    /// Seed an empty history store with every completed bar.
    Backfill,
    /// Enrich a CSV of bars and print one JSON record per line.
    Indicators {
        /// Bar file: timestamp,open,high,low,close,volume.
        #[arg(long)]
        bars: PathBuf,

        /// Print only the last N rows.
        #[arg(long)]
        tail: Option<usize>,
    },
    /// Enrich a CSV of bars and print events detected from a reference bar.
    Scan {
        #[arg(long)]
        bars: PathBuf,

        /// Open time of the reference bar. Defaults to the second-to-last bar.
        #[arg(long)]
        reference: Option<String>,
    },
    /// Write a random-walk bar file.
    Synthetic {
        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = 500)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// List the error codes.
    ErrorCodes,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { now } => run_once_cmd(config, now.as_deref()),
        Commands::Watch { max_runs } => watch_cmd(config, max_runs),
        Commands::Backfill => backfill_cmd(config),
        Commands::Indicators { bars, tail } => indicators_cmd(&config, &bars, tail),
        Commands::Scan { bars, reference } => scan_cmd(&config, &bars, reference.as_deref()),
        Commands::Synthetic { out, bars, seed } => synthetic_cmd(&out, bars, seed),
        Commands::ErrorCodes => {
            println!("{}", taxonomy());
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,crosstrend_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let fingerprint = hash_config(&config.engine)?;
    info!(engine = fingerprint.short(), "configuration loaded");
    Ok(config)
}

fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    match parse_bar_timestamp(text) {
        Some(ts) => Ok(ts),
        None => bail!("unrecognised timestamp '{text}'"),
    }
}

fn run_once_cmd(config: PipelineConfig, now: Option<&str>) -> Result<()> {
    let now = now.map(parse_instant).transpose()?.unwrap_or_else(Utc::now);
    let pipeline = Pipeline::from_config(config)?;
    let summary = pipeline.run_once(now)?;

    println!("New rows:  {}", summary.new_rows);
    println!("Events:    {}", summary.events.len());
    for event in &summary.events {
        println!("  {}", event.message);
    }
    if summary.notify_failures > 0 {
        println!("Failed notifications: {}", summary.notify_failures);
    }
    Ok(())
}

fn watch_cmd(config: PipelineConfig, max_runs: Option<usize>) -> Result<()> {
    let schedule = config.schedule.clone();
    let pipeline = Pipeline::from_config(config)?;
    let guard = SingleFlight::new();
    info!(
        interval_hours = schedule.interval_hours,
        offset_minutes = schedule.offset_minutes,
        "watching"
    );
    let runs = run_scheduled(&pipeline, &schedule, &guard, None, max_runs);
    info!(runs, "watch finished");
    Ok(())
}

fn backfill_cmd(config: PipelineConfig) -> Result<()> {
    let store = config.store_path.clone();
    let pipeline = Pipeline::from_config(config)?;
    let summary = pipeline.backfill(Utc::now())?;
    println!("Backfilled {} rows into {}", summary.rows, store.display());
    if let (Some(first), Some(last)) = (summary.first, summary.last) {
        println!("Range: {first} to {last}");
    }
    println!("Fingerprint: {}", summary.fingerprint.short());
    Ok(())
}

fn indicators_cmd(config: &PipelineConfig, bars: &Path, tail: Option<usize>) -> Result<()> {
    let bars = read_csv(bars)?;
    let rows = IndicatorEngine::new(config.engine.clone())?.enrich(&bars)?;
    let skip = tail.map_or(0, |n| rows.len().saturating_sub(n));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in &rows[skip..] {
        serde_json::to_writer(&mut out, &StoredRecord::from(row))?;
        writeln!(out)?;
    }
    let fingerprint = hash_rows(&rows);
    info!(rows = rows.len(), fingerprint = fingerprint.short(), "enriched");
    Ok(())
}

fn scan_cmd(config: &PipelineConfig, bars: &Path, reference: Option<&str>) -> Result<()> {
    let bars = read_csv(bars)?;
    let rows = IndicatorEngine::new(config.engine.clone())?.enrich(&bars)?;
    let reference = match reference {
        Some(text) => parse_instant(text)?,
        None => match rows.len().checked_sub(2) {
            Some(i) => rows[i].timestamp(),
            None => bail!("need at least two bars to pick a reference"),
        },
    };

    let events = SignalDetector::new(config.detector.clone()).scan(&rows, reference)?;
    if events.is_empty() {
        println!("No events from {reference}");
    }
    for event in &events {
        println!("{:<14} {}", event.kind.to_string(), event.message);
    }
    Ok(())
}

fn synthetic_cmd(out: &Path, bars: usize, seed: u64) -> Result<()> {
    let config = SyntheticConfig {
        bars,
        seed,
        ..SyntheticConfig::default()
    };
    let series = random_walk(&config);
    write_csv(out, &series)?;
    println!("Wrote {} bars to {}", series.len(), out.display());
    Ok(())
}
