use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Telemine telemetry event extractor.
#[derive(Parser)]
#[command(
    name = "telemine",
    version,
    about = "Extract tagged process-mining event logs from vehicle telemetry"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run every configured rule and write the tagged event log.
    Extract(ExtractArgs),
    /// Write wavelet-denoised copies of selected channels.
    Denoise(DenoiseArgs),
    /// Validate the configuration and its rules without reading telemetry.
    Check(CheckArgs),
}

/// Arguments for the `extract` subcommand.
#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "telemine.toml")]
    pub config: PathBuf,

    /// Override the telemetry input path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the event log output path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Evaluate rules in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Write skipped-rule diagnostics as JSON to this path.
    #[arg(long)]
    pub diagnostics: Option<PathBuf>,
}

/// Arguments for the `denoise` subcommand.
#[derive(clap::Args)]
pub struct DenoiseArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "telemine.toml")]
    pub config: PathBuf,

    /// Override the telemetry input path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Channels to denoise (comma separated).
    #[arg(long, value_delimiter = ',', required = true)]
    pub channels: Vec<String>,

    /// Output table path (.parquet or .csv).
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for the `check` subcommand.
#[derive(clap::Args)]
pub struct CheckArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "telemine.toml")]
    pub config: PathBuf,
}
