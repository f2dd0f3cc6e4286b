//! Check command implementation.

use anyhow::{Context, Result};
use nsdep_core::{AnalyzerConfig, DependencyAnalyzer, FactFileEnumerator, TracingSink};
use nsdep_remote::{AnalysisOutcome, KillSwitch, RemoteAnalyzerClient};
use std::path::{Path, PathBuf};

use super::output::{self, CheckResult};
use crate::config_resolver::ConfigSource;
use crate::{Mode, OutputFormat};

/// Runs the check command.
pub fn run(files: &[PathBuf], format: OutputFormat, mode: Mode, source: &ConfigSource) -> Result<()> {
    let config = load_config(source)?;
    config.validate().context("Config validation failed")?;

    let files = absolutize(files)?;
    let result = analyze(&config, &files, mode, KillSwitch::from_env())?;

    output::print(&result, format)?;

    if result.has_violations() {
        std::process::exit(1);
    }

    Ok(())
}

/// Runs the analysis and collects the outcome.
///
/// Both modes skip analysis when `kill_switch` is engaged.
///
/// # Errors
///
/// Fails if the analyzer could not run or the service was unreachable.
pub fn analyze(
    config: &AnalyzerConfig,
    files: &[PathBuf],
    mode: Mode,
    kill_switch: KillSwitch,
) -> Result<CheckResult> {
    tracing::info!("Checking {} file(s)", files.len());

    let outcome = match mode {
        Mode::Remote => RemoteAnalyzerClient::builder(config.clone())
            .kill_switch(kill_switch)
            .build()
            .analyze_project(files, &[])
            .context("Remote analysis failed")?,
        Mode::InProcess => analyze_in_process(config, files, &kill_switch)?,
    };

    let (violations, tool_disabled) = match outcome {
        AnalysisOutcome::Violations(v) => (v, false),
        AnalysisOutcome::ToolDisabled => (Vec::new(), true),
    };

    Ok(CheckResult {
        violations,
        severity: config.severity,
        files_checked: files.len(),
        tool_disabled,
    })
}

fn analyze_in_process(
    config: &AnalyzerConfig,
    files: &[PathBuf],
    kill_switch: &KillSwitch,
) -> Result<AnalysisOutcome> {
    if kill_switch.is_engaged() || !config.is_enabled {
        return Ok(AnalysisOutcome::ToolDisabled);
    }

    let enumerator = FactFileEnumerator::new();
    let report = DependencyAnalyzer::new(config, &enumerator)
        .analyze_project(files, &[], &TracingSink)
        .context("Analysis failed")?;

    Ok(AnalysisOutcome::Violations(report.illegal_dependencies))
}

fn load_config(source: &ConfigSource) -> Result<AnalyzerConfig> {
    match source {
        ConfigSource::Default => {
            tracing::debug!("No nsdep.toml found, using default configuration");
            Ok(AnalyzerConfig::default())
        }
        other => {
            let p = other.path().context("resolved config has no path")?;
            if source.is_global() {
                tracing::info!("Using global config: {}", p.display());
            }
            AnalyzerConfig::from_file(p).with_context(|| format!("Failed to load {}", p.display()))
        }
    }
}

/// The service host may run with a different working directory.
fn absolutize(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(files.iter().map(|f| absolute_in(&cwd, f)).collect())
}

fn absolute_in(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.join(file)
    }
}
