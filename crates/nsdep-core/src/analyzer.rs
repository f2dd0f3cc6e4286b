//! In-process dependency analysis: enumerator plus validator.

use crate::config::AnalyzerConfig;
use crate::enumerator::{EnumeratorError, TypeDependencyEnumerator};
use crate::pattern::PatternError;
use crate::trace::TraceSink;
use crate::types::TypeDependency;
use crate::validator::DependencyValidator;

use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A rule in the config is malformed.
    #[error("invalid rule: {0}")]
    Rule(#[from] PatternError),

    /// The dependency enumerator failed.
    #[error(transparent)]
    Enumerator(#[from] EnumeratorError),
}

/// Result of one analysis pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Illegal dependencies, in enumeration order, capped at `max_issue_count`.
    pub illegal_dependencies: Vec<TypeDependency>,
    /// Number of dependencies checked.
    pub dependencies_checked: usize,
    /// True if reporting stopped at the issue cap.
    pub truncated: bool,
    /// Validator cache hits during the pass.
    pub cache_hits: u64,
    /// Validator cache misses during the pass.
    pub cache_misses: u64,
    /// Cache efficiency in percent.
    pub cache_efficiency_percent: f64,
}

/// Runs an enumerator over a project and checks every dependency.
///
/// Each call to [`DependencyAnalyzer::analyze_project`] is one analysis
/// session with its own validator cache.
pub struct DependencyAnalyzer<'a> {
    config: &'a AnalyzerConfig,
    enumerator: &'a dyn TypeDependencyEnumerator,
}

impl<'a> DependencyAnalyzer<'a> {
    /// Creates an analyzer for one config and enumerator.
    #[must_use]
    pub fn new(config: &'a AnalyzerConfig, enumerator: &'a dyn TypeDependencyEnumerator) -> Self {
        Self { config, enumerator }
    }

    /// Analyzes the given files and returns the illegal dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules are malformed or enumeration fails.
    pub fn analyze_project(
        &self,
        source_files: &[PathBuf],
        referenced_assemblies: &[PathBuf],
        trace: &dyn TraceSink,
    ) -> Result<AnalysisReport, AnalyzerError> {
        let mut validator = DependencyValidator::new(self.config.rule_set()?);

        info!(
            "Analyzing {} file(s) with {} enumerator",
            source_files.len(),
            self.enumerator.name()
        );

        let dependencies =
            self.enumerator
                .enumerate(source_files, referenced_assemblies, trace)?;

        let mut report = AnalysisReport {
            dependencies_checked: dependencies.len(),
            ..AnalysisReport::default()
        };

        for dependency in dependencies {
            if validator.is_allowed_dependency(&dependency.from_namespace, &dependency.to_namespace) {
                continue;
            }
            if report.illegal_dependencies.len() >= self.config.max_issue_count {
                report.truncated = true;
                break;
            }
            debug!("Illegal dependency: {dependency}");
            report.illegal_dependencies.push(dependency);
        }

        if report.truncated {
            trace.trace(&format!(
                "Max issue count ({}) reached, analysis stopped.",
                self.config.max_issue_count
            ));
        }

        report.cache_hits = validator.cache_hit_count();
        report.cache_misses = validator.cache_miss_count();
        report.cache_efficiency_percent = validator.cache_efficiency_percent();
        trace.trace(&format!(
            "Cache hits: {}, cache misses: {}, efficiency (hits/all): {:.2}%",
            report.cache_hits, report.cache_misses, report.cache_efficiency_percent
        ));

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSpec;
    use crate::types::SourceSegment;
    use std::sync::Mutex;

    /// Enumerator returning a fixed list of dependencies.
    struct Fixed(Vec<TypeDependency>);

    impl TypeDependencyEnumerator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn enumerate(
            &self,
            _source_files: &[PathBuf],
            _referenced_assemblies: &[PathBuf],
            _trace: &dyn TraceSink,
        ) -> Result<Vec<TypeDependency>, EnumeratorError> {
            Ok(self.0.clone())
        }
    }

    fn dep(from: &str, to: &str, line: usize) -> TypeDependency {
        TypeDependency::new(from, to, SourceSegment::new(line, 1, 10))
    }

    #[test]
    fn reports_only_illegal_dependencies() {
        let config = AnalyzerConfig {
            allowed: vec![RuleSpec::Target("A.*".into())],
            ..AnalyzerConfig::default()
        };
        let enumerator = Fixed(vec![dep("A.B", "A.C", 1), dep("A.B", "Z", 2), dep("A.B", "A.C", 3)]);

        let report = DependencyAnalyzer::new(&config, &enumerator)
            .analyze_project(&[], &[], &|_: &str| {})
            .unwrap();

        assert_eq!(report.dependencies_checked, 3);
        assert_eq!(report.illegal_dependencies, vec![dep("A.B", "Z", 2)]);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.cache_misses, 2);
        assert!(!report.truncated);
    }

    #[test]
    fn stops_at_max_issue_count() {
        let config = AnalyzerConfig {
            max_issue_count: 2,
            ..AnalyzerConfig::default()
        };
        let enumerator = Fixed((1..=5).map(|i| dep("X", "Y", i)).collect());
        let traces = Mutex::new(Vec::new());
        let sink = |m: &str| traces.lock().unwrap().push(m.to_string());

        let report = DependencyAnalyzer::new(&config, &enumerator)
            .analyze_project(&[], &[], &sink)
            .unwrap();

        assert_eq!(report.illegal_dependencies.len(), 2);
        assert!(report.truncated);
        assert!(traces.lock().unwrap()[0].contains("Max issue count (2)"));
    }

    #[test]
    fn malformed_rule_is_an_error() {
        let config = AnalyzerConfig {
            disallowed: vec![RuleSpec::Target("..".into())],
            ..AnalyzerConfig::default()
        };
        let result = DependencyAnalyzer::new(&config, &Fixed(vec![]))
            .analyze_project(&[], &[], &|_: &str| {});
        assert!(matches!(result, Err(AnalyzerError::Rule(_))));
    }
}
