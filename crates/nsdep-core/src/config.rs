//! Configuration types for nsdep.
//!
//! The config is produced by the caller (usually from `nsdep.toml`) and sent
//! along with every analysis request, so it is both `Serialize` and
//! `Deserialize`.

use crate::pattern::{NamespacePattern, PatternError};
use crate::retry::RetrySchedule;
use crate::rules::{DependencyRule, RuleSet};
use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Analyzer configuration for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// When false the project is not analyzed at all.
    #[serde(default = "default_true")]
    pub is_enabled: bool,

    /// Whether a namespace may reference its ancestors without a rule.
    #[serde(default)]
    pub child_can_depend_on_parent_implicitly: bool,

    /// Upper bound on reported violations per analysis.
    #[serde(default = "default_max_issue_count")]
    pub max_issue_count: usize,

    /// Severity of reported violations.
    #[serde(default = "default_severity")]
    pub severity: Severity,

    /// Wait before each retry of a failed service call, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: Vec<u64>,

    /// Allowed dependencies.
    #[serde(default)]
    pub allowed: Vec<RuleSpec>,

    /// Disallowed dependencies; these win over `allowed`.
    #[serde(default)]
    pub disallowed: Vec<RuleSpec>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            is_enabled: true,
            child_can_depend_on_parent_implicitly: false,
            max_issue_count: default_max_issue_count(),
            severity: default_severity(),
            retry_backoff_ms: default_retry_backoff_ms(),
            allowed: Vec::new(),
            disallowed: Vec::new(),
        }
    }
}

/// A rule as written in the config file.
///
/// Either a bare target pattern (`"A.*"`, meaning from any namespace) or an
/// explicit `{ from = "...", to = "..." }` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// Target pattern only.
    Target(String),
    /// Explicit source and target patterns.
    Pair {
        /// Source namespace pattern.
        from: String,
        /// Target namespace pattern.
        to: String,
    },
}

impl RuleSpec {
    /// Converts the spec into a validated rule.
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is malformed.
    pub fn to_rule(&self) -> Result<DependencyRule, PatternError> {
        match self {
            Self::Target(to) => Ok(DependencyRule::to_target(NamespacePattern::new(to)?)),
            Self::Pair { from, to } => DependencyRule::parse(from, to),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_issue_count() -> usize {
    100
}

fn default_severity() -> Severity {
    Severity::Warning
}

fn default_retry_backoff_ms() -> Vec<u64> {
    vec![100, 1000, 5000]
}

/// Errors when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML.
    #[error("invalid config: {message}")]
    Parse {
        /// Parse error detail.
        message: String,
    },
    /// Config is structurally invalid.
    #[error("config validation: {0}")]
    Validation(String),
}

impl AnalyzerConfig {
    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parse from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Validate config consistency.
    ///
    /// # Errors
    ///
    /// Returns error describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, specs) in [("allowed", &self.allowed), ("disallowed", &self.disallowed)] {
            for (i, spec) in specs.iter().enumerate() {
                spec.to_rule()
                    .map_err(|e| ConfigError::Validation(format!("{section}[{i}]: {e}")))?;
            }
        }
        if self.max_issue_count == 0 {
            return Err(ConfigError::Validation(
                "max_issue_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the immutable rule set for an analysis session.
    ///
    /// # Errors
    ///
    /// Returns error if a rule pattern is malformed.
    pub fn rule_set(&self) -> Result<RuleSet, PatternError> {
        let allowed = self
            .allowed
            .iter()
            .map(RuleSpec::to_rule)
            .collect::<Result<Vec<_>, _>>()?;
        let disallowed = self
            .disallowed
            .iter()
            .map(RuleSpec::to_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet::new(
            allowed,
            disallowed,
            self.child_can_depend_on_parent_implicitly,
        ))
    }

    /// Backoff schedule for service calls.
    #[must_use]
    pub fn retry_schedule(&self) -> RetrySchedule {
        RetrySchedule::from_millis(&self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = AnalyzerConfig::parse("").expect("parse failed");
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.retry_schedule().len(), 3);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
is_enabled = true
child_can_depend_on_parent_implicitly = true
max_issue_count = 10
severity = "error"
retry_backoff_ms = [50, 50]

allowed = ["A.*", { from = "App.*", to = "Domain.*" }]
disallowed = [{ from = "*", to = "A.Internal.*" }]
"#;
        let config = AnalyzerConfig::parse(toml).expect("parse failed");
        assert!(config.validate().is_ok());
        assert_eq!(config.severity, Severity::Error);
        assert_eq!(config.allowed.len(), 2);
        assert_eq!(config.allowed[0], RuleSpec::Target("A.*".into()));

        let rules = config.rule_set().expect("rules");
        assert!(rules.child_can_depend_on_parent_implicitly());
        assert_eq!(rules.allowed()[1].to_string(), "App.* -> Domain.*");
        assert_eq!(rules.disallowed()[0].to_string(), "* -> A.Internal.*");
    }

    #[test]
    fn validate_rejects_bad_pattern() {
        let config = AnalyzerConfig::parse(r#"allowed = ["A.*.B"]"#).expect("parse failed");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("allowed[0]"));
    }

    #[test]
    fn validate_rejects_zero_issue_cap() {
        let config = AnalyzerConfig::parse("max_issue_count = 0").expect("parse failed");
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = AnalyzerConfig::parse("allowed = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn config_survives_json_transport() {
        let config = AnalyzerConfig::parse(r#"allowed = ["A.*", { from = "B", to = "C" }]"#)
            .expect("parse failed");
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
