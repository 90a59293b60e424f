// chart-analyze: batch difficulty-signal extraction for chart files.
//
// Prints one JSON record per input path.

mod report;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chart_metrics::{MetricConfig, MetricExtractor};
use clap::Parser;
use log::info;
use rayon::prelude::*;

use report::ChartReport;

#[derive(Parser, Debug)]
#[command(
    name = "chart-analyze",
    about = "Extract per-window difficulty signals from BMS and osu!mania charts"
)]
struct Args {
    /// Chart files (.bms, .bme, .bml, .pms, .osu)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Metric config JSON file
    #[arg(long, env = "CHART_ANALYZE_CONFIG")]
    config: Option<PathBuf>,

    /// Window length in seconds (overrides the config file)
    #[arg(long)]
    window_size: Option<f64>,

    /// Worker threads (default: one per core)
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Write JSON here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Include the resolved note list in each record
    #[arg(long)]
    notes: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &args.config {
        Some(path) => MetricConfig::read(path)
            .with_context(|| format!("failed to load metric config {}", path.display()))?,
        None => MetricConfig::default(),
    };
    if let Some(window_size) = args.window_size {
        config.window_size = window_size;
    }
    let extractor = MetricExtractor::new(config);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .context("failed to build worker pool")?;
    info!(
        "analyzing {} charts on {} threads (window {}s)",
        args.paths.len(),
        pool.current_num_threads(),
        extractor.config().window_size
    );

    let reports: Vec<ChartReport> = pool.install(|| {
        args.paths
            .par_iter()
            .map(|path| report::analyze_path(path, &extractor, args.notes))
            .collect()
    });

    let failed = reports.iter().filter(|r| r.is_failed()).count();
    info!("{} analyzed, {} failed", reports.len() - failed, failed);

    let json = if args.pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };
    match &args.output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    if failed == reports.len() {
        bail!("all {failed} charts failed");
    }
    Ok(())
}
