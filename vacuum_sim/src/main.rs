//! Vacuum competition CLI
//!
//! Runs every built-in algorithm on every house in a directory and writes
//! the scores.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vacuum_sim::{AlgorithmRegistry, Competition, HarnessConfig, HarnessError, ScheduleReport};

/// Vacuum cleaner competition harness
#[derive(Parser, Debug)]
#[command(name = "vacuum-sim")]
#[command(about = "Run vacuum navigation algorithms against house files", long_about = None)]
struct Args {
    /// Directory containing *.house files
    #[arg(long)]
    house_path: Option<PathBuf>,

    /// Directory for result files and summary.csv
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short = 'n', long)]
    num_threads: Option<usize>,

    /// Only write summary.csv
    #[arg(long)]
    summary_only: bool,

    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn harness_config(&self) -> Result<HarnessConfig, HarnessError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_json_file(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(path) = &self.house_path {
            config = config.with_house_path(path);
        }
        if let Some(path) = &self.output {
            config = config.with_output_dir(path);
        }
        if let Some(num_threads) = self.num_threads {
            config = config.with_num_threads(num_threads);
        }
        if self.summary_only {
            config = config.with_summary_only(true);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    let config = match args.harness_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !args.json {
        info!("Vacuum competition v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let registry = AlgorithmRegistry::with_builtin();
    let report = match Competition::new(config).run(&registry) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        print_json(&report);
    } else {
        print_summary(&report);
    }
    ExitCode::SUCCESS
}

fn print_json(report: &ScheduleReport) {
    let summary = serde_json::json!({
        "houses": report.table.houses(),
        "algorithms": report.table.algorithms(),
        "total": report.table.houses().len() * report.table.algorithms().len(),
        "recorded": report.table.len(),
        "elapsed_ms": report.elapsed.as_millis() as u64,
        "results": report.table.entries().map(|(house, algorithm, outcome)| {
            serde_json::json!({
                "house": house,
                "algorithm": algorithm,
                "status": outcome.status,
                "score": outcome.score,
                "steps": outcome.steps_taken,
                "dirt_left": outcome.dirt_left,
                "in_dock": outcome.in_dock,
            })
        }).collect::<Vec<_>>(),
        "diagnostics": report.diagnostics,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(e) => error!("Failed to render JSON summary: {}", e),
    }
}

fn print_summary(report: &ScheduleReport) {
    info!("");
    for (house, algorithm, outcome) in report.table.entries() {
        info!(
            "{:<24} {:<28} {:<9} score={}",
            house, algorithm, outcome.status, outcome.score
        );
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if report.diagnostics.is_empty() {
        info!("✅ {} results recorded in {:.2?}", report.table.len(), report.elapsed);
    } else {
        warn!(
            "⚠ {} results recorded with {} diagnostics",
            report.table.len(),
            report.diagnostics.len()
        );
        for diagnostic in &report.diagnostics {
            warn!("  - {}", diagnostic);
        }
    }
}
