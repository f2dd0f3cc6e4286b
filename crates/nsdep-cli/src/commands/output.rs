//! Shared output formatting for check results.

use anyhow::Result;
use miette::Diagnostic;
use nsdep_core::{IllegalDependencyDiagnostic, Severity, TypeDependency, ILLEGAL_DEPENDENCY_CODE};
use serde::Serialize;
use std::fmt::Write as _;

use crate::OutputFormat;

/// Result of one `check` run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Illegal dependencies, in report order.
    pub violations: Vec<TypeDependency>,
    /// Severity every violation is reported with.
    pub severity: Severity,
    /// Number of source files submitted.
    pub files_checked: usize,
    /// True if analysis was skipped because tooling is disabled.
    pub tool_disabled: bool,
}

impl CheckResult {
    /// True if at least one violation was found.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Print check results in the specified format.
pub fn print(result: &CheckResult, format: OutputFormat) -> Result<()> {
    let rendered = render(result, format)?;
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(())
}

/// Renders check results without printing them.
pub fn render(result: &CheckResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Compact => render_compact(result),
    })
}

fn render_text(result: &CheckResult) -> String {
    let mut out = String::new();

    if result.tool_disabled {
        out.push_str("nsdep is disabled; no analysis was performed");
        return out;
    }

    let severity_indicator = match result.severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    };

    for dependency in &result.violations {
        let diagnostic = IllegalDependencyDiagnostic::new(dependency, result.severity);
        let _ = writeln!(
            out,
            "{} at {}",
            ILLEGAL_DEPENDENCY_CODE, dependency.source_segment
        );
        let _ = writeln!(out, "  {}: {}", severity_indicator, dependency.message());
        if let Some(help) = diagnostic.help() {
            let _ = writeln!(out, "  = help: {help}");
        }
        out.push('\n');
    }

    let summary_color = if !result.has_violations() {
        "\x1b[32m"
    } else if result.severity == Severity::Error {
        "\x1b[31m"
    } else {
        "\x1b[33m"
    };

    let _ = write!(
        out,
        "{}Found {} illegal dependenc{} in {} file(s)\x1b[0m",
        summary_color,
        result.violations.len(),
        if result.violations.len() == 1 { "y" } else { "ies" },
        result.files_checked
    );
    out
}

fn render_compact(result: &CheckResult) -> String {
    result
        .violations
        .iter()
        .map(|dependency| {
            format!(
                "{}: {} [{}] {}",
                dependency.source_segment,
                result.severity,
                ILLEGAL_DEPENDENCY_CODE,
                dependency.message(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsdep_core::SourceSegment;

    fn result(violations: Vec<TypeDependency>) -> CheckResult {
        CheckResult {
            violations,
            severity: Severity::Warning,
            files_checked: 2,
            tool_disabled: false,
        }
    }

    fn internal() -> TypeDependency {
        TypeDependency::new(
            "A.B",
            "A.Internal",
            SourceSegment::new(7, 3, 11).with_path("src/B.cs"),
        )
        .with_types("Foo", "Secret")
    }

    #[test]
    fn compact_is_one_line_per_violation() {
        let out = render(&result(vec![internal(), internal()]), OutputFormat::Compact).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "src/B.cs:7:3-11: warning [NSDEP01] Illegal namespace reference: A.B->A.Internal (Type: Foo->Secret)"
        );
    }

    #[test]
    fn text_includes_help_and_summary() {
        let out = render(&result(vec![internal()]), OutputFormat::Text).unwrap();
        assert!(out.contains("NSDEP01 at src/B.cs:7:3-11"));
        assert!(out.contains("= help: allow `A.B` -> `A.Internal`"));
        assert!(out.contains("Found 1 illegal dependency in 2 file(s)"));
    }

    #[test]
    fn text_reports_disabled_tooling() {
        let mut disabled = result(vec![]);
        disabled.tool_disabled = true;
        let out = render(&disabled, OutputFormat::Text).unwrap();
        assert!(out.contains("disabled"));
    }

    #[test]
    fn json_is_machine_readable() {
        let out = render(&result(vec![internal()]), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["violations"][0]["to_namespace"], "A.Internal");
        assert_eq!(value["files_checked"], 2);
    }
}
