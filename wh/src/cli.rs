//! CLI argument parsing for winhello

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wh")]
#[command(author, version, about = "Cross-window handshake harness", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch simulated contexts and run the readiness gate
    Check {
        /// Launch N generated frames instead of the configured windows
        #[arg(short = 'n', long)]
        windows: Option<usize>,

        /// Gate deadline in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Simulated bootstrap delay in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,

        /// Name of a window that never announces readiness
        #[arg(long)]
        silence: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

/// How check results are rendered
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}
