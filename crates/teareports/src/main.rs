//! teareports CLI
//!
//! Runs the registered extraction jobs, consolidates their output batches into
//! the report library and computes auction statistics from it.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use teareports::analytics::AnalysisReport;
use teareports::config::{load_config, Config};
use teareports::consolidate::Consolidator;
use teareports::logging::{self, LogFormat};
use teareports::refresh::{analyze_library, refresh_library};
use teareports::storage::ArtifactStore;
use teareports::worker::{ExecutionSummary, JobRegistry, Orchestrator};

/// Exit code when consolidation or analysis halts.
const EXIT_CONSOLIDATION_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "teareports")]
#[command(about = "Tea market report job runner and library consolidator", long_about = None)]
struct Cli {
    /// Config file (JSON or YAML). Built-in defaults are used when omitted.
    #[arg(long, short, global = true, env = "TEAREPORTS_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all enabled extraction jobs, then consolidate and analyze
    Run {
        /// Maximum number of jobs running at once
        #[arg(long, env = "TEAREPORTS_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Only run these source ids (repeatable)
        #[arg(long = "job", value_name = "SOURCE_ID")]
        jobs: Vec<String>,

        /// Stop after the extraction run
        #[arg(long)]
        skip_consolidate: bool,
    },

    /// Merge source report batches into the library
    Consolidate {
        #[arg(long, value_name = "DIR")]
        source_reports: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        library: Option<PathBuf>,
    },

    /// Compute lot statistics from the library
    Analyze {
        #[arg(long, value_name = "FILE")]
        library: Option<PathBuf>,

        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// List registered jobs
    Jobs,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init(cli.log_format, logging::DEFAULT_FILTER)?;

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    match cli.command {
        Commands::Run {
            concurrency,
            jobs,
            skip_consolidate,
        } => run(&config, concurrency, &jobs, skip_consolidate).await,
        Commands::Consolidate {
            source_reports,
            library,
        } => {
            let source_reports = source_reports.unwrap_or_else(|| config.source_reports_path());
            let library = library.unwrap_or_else(|| config.library_path());
            match Consolidator::new(source_reports, library).run() {
                Ok((_, report)) => {
                    println!("{}", report.summary_line());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!("Consolidation halted: {}", e);
                    Ok(ExitCode::from(EXIT_CONSOLIDATION_FAILED))
                }
            }
        }
        Commands::Analyze { library, output } => {
            let library_path = library.unwrap_or_else(|| config.library_path());
            let output = output.unwrap_or_else(|| config.analysis_path());
            match analyze_library(&config, &library_path, &output) {
                Ok(report) => {
                    print_analysis(&report);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!("Analysis halted: {}", e);
                    Ok(ExitCode::from(EXIT_CONSOLIDATION_FAILED))
                }
            }
        }
        Commands::Jobs => {
            let registry = JobRegistry::from_config(&config)?;
            for job in registry.jobs() {
                println!(
                    "{:<24} timeout {:>6}s  attempts {}  {}",
                    job.source_id,
                    job.timeout.as_secs(),
                    job.retry_policy.max_attempts,
                    job.extractor.describe()
                );
            }
            for source_id in registry.disabled() {
                println!("{:<24} (disabled)", source_id);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(
    config: &Config,
    concurrency: Option<usize>,
    only: &[String],
    skip_consolidate: bool,
) -> Result<ExitCode> {
    let mut registry = JobRegistry::from_config(config)?;
    if !only.is_empty() {
        registry = registry.select(only);
    }
    if registry.is_empty() {
        warn!("No jobs to run");
    }

    let concurrency = concurrency.unwrap_or(config.concurrency);
    let summary = Orchestrator::new(config.raw_path())
        .run(registry.jobs(), concurrency)
        .await;
    report_summary(config, &summary)?;

    if !skip_consolidate {
        match refresh_library(config) {
            Ok(refreshed) => {
                println!("{}", refreshed.consolidation.summary_line());
                print_analysis(&refreshed.analysis);
            }
            Err(e) => {
                error!("Consolidation halted: {}", e);
                return Ok(ExitCode::from(EXIT_CONSOLIDATION_FAILED));
            }
        }
    }

    Ok(ExitCode::from(summary.exit_code() as u8))
}

fn report_summary(config: &Config, summary: &ExecutionSummary) -> Result<()> {
    for outcome in &summary.outcomes {
        println!(
            "{:<24} {:<8} attempts {}  {}",
            outcome.source_id,
            outcome.status,
            outcome.attempts,
            outcome.error_detail.as_deref().unwrap_or("")
        );
    }
    println!(
        "{} jobs: {} succeeded, {} failed ({} timed out)",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.timed_out()
    );

    let path = ArtifactStore::new(config.reports_path())
        .write_json(
            format!("execution_summary_{}.json", summary.run_id.simple()),
            summary,
        )
        .context("Failed to write execution summary")?;
    info!("Execution summary written to {}", path.display());
    Ok(())
}

fn print_analysis(report: &AnalysisReport) {
    for group in &report.groups {
        println!(
            "{} {} sale {} ({}): {} lots sold, average {:.2}",
            group.location,
            group.report_type,
            group.sale_number,
            group.year,
            group.overall.total_lots_sold,
            group.overall.weighted_average_price
        );
    }
}
