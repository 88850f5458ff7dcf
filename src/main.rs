//! CLI entry point for the taxonomic statistics tool.
//!
//! Reads a species observation table, writes per-phylum totals and averages
//! to a CSV file, and renders a bar chart of the totals.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use taxonomic_stats::chart::ChartStyle;
use taxonomic_stats::error::PipelineError;
use taxonomic_stats::output::{print_pretty, to_json};
use taxonomic_stats::pipeline::{Paths, RunOutcome, run};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "taxonomic_stats")]
#[command(
    about = "Calculate per-phylum species count statistics and plot them",
    long_about = "Processes taxonomic species data to calculate summary statistics, \
                  save results to a CSV file, and generate a bar chart visualization.\n\n\
                  Examples:\n  \
                  taxonomic_stats\n  \
                  taxonomic_stats -i custom_data.csv -o custom_summary.csv -p custom_plot.png"
)]
struct Cli {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "taxonomic_data.csv")]
    input: PathBuf,

    /// Path to the output CSV file
    #[arg(short, long, default_value = "phylum_summary.csv")]
    output: PathBuf,

    /// Path to the output bar chart image file
    #[arg(short, long, default_value = "phylum_species_count.png")]
    plot: PathBuf,

    /// Chart width in pixels
    #[arg(long, default_value_t = ChartStyle::default().width)]
    width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = ChartStyle::default().height)]
    height: u32,

    /// Also print the summary as JSON to stdout
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    let _file_guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let paths = Paths {
        input: cli.input,
        output: cli.output,
        plot: cli.plot,
    };
    let style = ChartStyle {
        width: cli.width,
        height: cli.height,
    };

    ExitCode::from(finish(run(&paths, &style), cli.json))
}

/// Logs the outcome of a run and returns the process exit status.
fn finish(result: Result<RunOutcome, PipelineError>, json: bool) -> u8 {
    match result {
        Ok(outcome) => {
            print_pretty(&outcome.summary);
            if json {
                match to_json(&outcome) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        error!(error = %e, "Failed to render summary as JSON");
                        return 1;
                    }
                }
            }
            info!(
                rows_kept = outcome.report.rows_kept,
                rows_dropped = outcome.report.rows_dropped(),
                phyla = outcome.summary.len(),
                "Run finished"
            );
            0
        }
        Err(e) => {
            error!(kind = ?e.kind(), "{e}");
            e.exit_code()
        }
    }
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/taxonomic_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("taxonomic_stats.log"));

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log_file_name.to_string_lossy().into_owned())
        .build(log_dir)?;
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(file_guard)
}
