//! nsdep CLI tool.
//!
//! Usage:
//! ```bash
//! nsdep check [OPTIONS] <FILES>...
//! nsdep init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Namespace dependency checker
#[derive(Parser)]
#[command(name = "nsdep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check source files for illegal namespace dependencies
    Check {
        /// Source files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Run the analyzer in this process instead of the service host
        #[arg(long)]
        in_process: bool,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

/// How the analysis is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Through the analyzer service host.
    Remote,
    /// Directly in the CLI process.
    InProcess,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            files,
            format,
            in_process,
        } => {
            let mode = if in_process {
                Mode::InProcess
            } else {
                Mode::Remote
            };
            let source = config_resolver::resolve(&std::env::current_dir()?, cli.config.as_deref());
            commands::check::run(&files, format, mode, &source)
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
