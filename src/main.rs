//! CLI entry point for the agency innovation metrics tool.
//!
//! Provides one subcommand per dataset: innovation challenges, USAJobs
//! hiring, and open-source repository statistics. Each run reads its CSV
//! exports, computes the derived tables, and writes them out.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use agency_metrics::datasets::{challenges, hiring, oss};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "agency_metrics")]
#[command(about = "Compute normalized innovation metrics for federal agencies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the innovation challenge export
    Challenges {
        /// Raw challenge export CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// Directory to write derived CSVs to
        #[arg(short, long, default_value = "derived")]
        output_dir: PathBuf,
    },
    /// Analyze USAJobs listings for the environmental agencies
    Hiring {
        /// USAJobs listing summary CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// Agency workforce reference CSV
        #[arg(short, long, default_value = "workforce.csv")]
        workforce: PathBuf,

        /// Directory to write derived CSVs to
        #[arg(short, long, default_value = "derived")]
        output_dir: PathBuf,
    },
    /// Analyze GitHub open-source language statistics
    OpenSource {
        /// Wide agency-by-language count CSV
        #[arg(value_name = "LANGUAGES_CSV")]
        languages: PathBuf,

        /// Per-agency repository overview CSV
        #[arg(value_name = "INNOVATION_CSV")]
        innovation: PathBuf,

        /// Directory to write derived CSVs to
        #[arg(short, long, default_value = "derived")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/agency_metrics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("agency_metrics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Challenges { input, output_dir } => challenges::run(&input, &output_dir),
        Commands::Hiring {
            input,
            workforce,
            output_dir,
        } => hiring::run(&input, &workforce, &output_dir),
        Commands::OpenSource {
            languages,
            innovation,
            output_dir,
        } => oss::run(&languages, &innovation, &output_dir),
    }
}
