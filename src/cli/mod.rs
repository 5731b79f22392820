//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use scan_engine::PreflightPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "market-scan")]
#[command(author, version, about = "Fan-out market, technical and options analysis over a ticker universe")]
pub struct Cli {
    /// Configuration file path; defaults plus SCAN__* environment overrides when omitted
    #[arg(short, long, env = "SCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a batch over a ticker universe
    Run(RunArgs),
    /// Check that the backend services are up
    Health(HealthArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PreflightArg {
    Proceed,
    Abort,
    SkipService,
}

impl From<PreflightArg> for PreflightPolicy {
    fn from(arg: PreflightArg) -> Self {
        match arg {
            PreflightArg::Proceed => PreflightPolicy::Proceed,
            PreflightArg::Abort => PreflightPolicy::Abort,
            PreflightArg::SkipService => PreflightPolicy::SkipService,
        }
    }
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Tickers to scan (comma-separated)
    #[arg(short, long, value_delimiter = ',', conflicts_with = "universe")]
    pub tickers: Vec<String>,

    /// CSV file with a ticker or symbol column
    #[arg(short, long, required_unless_present = "tickers")]
    pub universe: Option<PathBuf>,

    /// Write the batch JSON here instead of the configured output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum service calls in flight
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Abandon unsettled tickers after this many seconds
    #[arg(long)]
    pub batch_timeout: Option<u64>,

    /// Pre-flight health check policy
    #[arg(long)]
    pub preflight: Option<PreflightArg>,

    /// Print a text summary to stderr
    #[arg(long)]
    pub summary: bool,

    /// Use scripted in-memory services instead of the HTTP backends
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args)]
pub struct HealthArgs {
    /// Check the scripted in-memory services
    #[arg(long)]
    pub dry_run: bool,
}
