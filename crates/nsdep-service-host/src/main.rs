//! nsdep analyzer service host.
//!
//! Started by the analysis client with the client's process id:
//! ```bash
//! nsdep-service-host <parentprocessid>
//! ```
//!
//! Exit codes: `0` after the parent exited, `-1` on bad arguments,
//! `-2` if the service could not start.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use nsdep_core::FactFileEnumerator;
use nsdep_remote::{ParentWatchdog, ServiceAddress, ServiceHost};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: nsdep-service-host <parentprocessid>";

/// Out-of-process analyzer service bound to a parent process
#[derive(Parser, Debug)]
#[command(name = "nsdep-service-host")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Process id of the caller that owns this service
    parent_pid: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return 0;
        }
        Err(_) => {
            eprintln!("{USAGE}");
            return -1;
        }
    };

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

    match serve(cli.parent_pid) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Exception caught: {e:#}");
            -2
        }
    }
}

fn serve(parent_pid: u32) -> Result<()> {
    let address = ServiceAddress::for_owner(parent_pid);
    let host = ServiceHost::bind(address, Box::new(FactFileEnumerator::new()))
        .context("Failed to start analyzer service")?;

    host.run_until_parent_exits(ParentWatchdog::for_parent(parent_pid))
        .context("Analyzer service failed")?;

    tracing::info!("Analyzer service shut down");
    Ok(())
}
