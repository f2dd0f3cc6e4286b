//! Core types for namespace dependencies and their diagnostics.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level reported for illegal dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the build.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location span of a dependency, on a single line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSegment {
    /// Line number (1-indexed).
    pub line: usize,
    /// First column of the span (1-indexed).
    pub start_column: usize,
    /// Last column of the span (1-indexed, inclusive).
    pub end_column: usize,
    /// File the span belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SourceSegment {
    /// Creates a new segment without a file path.
    #[must_use]
    pub fn new(line: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            line,
            start_column,
            end_column,
            path: None,
        }
    }

    /// Attaches the file path to this segment.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for SourceSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}:", path.display())?;
        }
        write!(f, "{}:{}-{}", self.line, self.start_column, self.end_column)
    }
}

/// A directed dependency from one namespace to another, found in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDependency {
    /// Namespace of the referencing type.
    pub from_namespace: String,
    /// Name of the referencing type.
    #[serde(default)]
    pub from_type: String,
    /// Namespace of the referenced type.
    pub to_namespace: String,
    /// Name of the referenced type.
    #[serde(default)]
    pub to_type: String,
    /// Where the reference occurs.
    pub source_segment: SourceSegment,
}

impl TypeDependency {
    /// Creates a dependency between two namespaces with no type names.
    #[must_use]
    pub fn new(
        from_namespace: impl Into<String>,
        to_namespace: impl Into<String>,
        source_segment: SourceSegment,
    ) -> Self {
        Self {
            from_namespace: from_namespace.into(),
            from_type: String::new(),
            to_namespace: to_namespace.into(),
            to_type: String::new(),
            source_segment,
        }
    }

    /// Sets the referencing and referenced type names.
    #[must_use]
    pub fn with_types(mut self, from_type: impl Into<String>, to_type: impl Into<String>) -> Self {
        self.from_type = from_type.into();
        self.to_type = to_type.into();
        self
    }

    /// Human-readable description of the illegal reference.
    #[must_use]
    pub fn message(&self) -> String {
        if self.from_type.is_empty() && self.to_type.is_empty() {
            format!(
                "Illegal namespace reference: {}->{}",
                self.from_namespace, self.to_namespace
            )
        } else {
            format!(
                "Illegal namespace reference: {}->{} (Type: {}->{})",
                self.from_namespace, self.to_namespace, self.from_type, self.to_type
            )
        }
    }
}

impl std::fmt::Display for TypeDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source_segment, self.message())
    }
}

/// Diagnostic code for illegal namespace references.
pub const ILLEGAL_DEPENDENCY_CODE: &str = "NSDEP01";

/// An illegal dependency rendered as a miette diagnostic.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("[{code}] {message} at {segment}")]
pub struct IllegalDependencyDiagnostic {
    code: &'static str,
    message: String,
    segment: SourceSegment,
    #[help]
    help: Option<String>,
    /// Severity the diagnostic was raised with.
    pub severity: Severity,
}

impl IllegalDependencyDiagnostic {
    /// Wraps an illegal dependency with the configured severity.
    #[must_use]
    pub fn new(dependency: &TypeDependency, severity: Severity) -> Self {
        Self {
            code: ILLEGAL_DEPENDENCY_CODE,
            message: dependency.message(),
            segment: dependency.source_segment.clone(),
            help: Some(format!(
                "allow `{}` -> `{}` in nsdep.toml or remove the reference",
                dependency.from_namespace, dependency.to_namespace
            )),
            severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_without_types() {
        let dep = TypeDependency::new("A.B", "A.Internal", SourceSegment::new(3, 5, 12));
        assert_eq!(dep.message(), "Illegal namespace reference: A.B->A.Internal");
    }

    #[test]
    fn display_includes_path_and_types() {
        let dep = TypeDependency::new(
            "A.B",
            "A.Internal",
            SourceSegment::new(3, 5, 12).with_path("src/B.cs"),
        )
        .with_types("Foo", "Secret");
        insta::assert_snapshot!(
            dep.to_string(),
            @"src/B.cs:3:5-12: Illegal namespace reference: A.B->A.Internal (Type: Foo->Secret)"
        );
    }

    #[test]
    fn diagnostic_carries_code() {
        let dep = TypeDependency::new("A", "B", SourceSegment::new(1, 1, 2));
        let diag = IllegalDependencyDiagnostic::new(&dep, Severity::Error);
        assert!(diag.to_string().starts_with("[NSDEP01]"));
        assert_eq!(diag.severity, Severity::Error);
    }

    #[test]
    fn segment_path_is_optional_on_the_wire() {
        let json = serde_json::to_string(&SourceSegment::new(1, 2, 3)).unwrap();
        assert_eq!(json, r#"{"line":1,"start_column":2,"end_column":3}"#);
    }
}
