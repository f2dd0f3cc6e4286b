//! # nsdep-core
//!
//! Namespace dependency rules and the legality decision engine.
//!
//! This crate provides:
//!
//! - [`NamespacePattern`] and [`RuleSet`] for allow/disallow rules
//! - [`DependencyValidator`] for cached per-pair legality verdicts
//! - [`TypeDependencyEnumerator`] as the seam for external source analyzers
//! - [`DependencyAnalyzer`] for running an analysis pass in process
//! - [`AnalyzerConfig`] for TOML-based configuration
//!
//! ## Example
//!
//! ```
//! use nsdep_core::{DependencyValidator, RuleSet};
//!
//! let rules = RuleSet::builder()
//!     .allow("*", "A.*")?
//!     .disallow("*", "A.Internal.*")?
//!     .build();
//! let mut validator = DependencyValidator::new(rules);
//!
//! assert!(validator.is_allowed_dependency("A.B", "A.C"));
//! assert!(!validator.is_allowed_dependency("A.B", "A.Internal.X"));
//! # Ok::<(), nsdep_core::PatternError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod enumerator;
mod pattern;
mod retry;
mod rules;
mod trace;
mod types;
mod validator;

pub use analyzer::{AnalysisReport, AnalyzerError, DependencyAnalyzer};
pub use config::{AnalyzerConfig, ConfigError, RuleSpec};
pub use enumerator::{
    EnumeratorError, FactFileEnumerator, TypeDependencyEnumerator, DEFAULT_FACT_SUFFIX,
};
pub use pattern::{is_strict_ancestor, NamespacePattern, PatternError};
pub use retry::RetrySchedule;
pub use rules::{DependencyRule, RuleSet, RuleSetBuilder};
pub use trace::{TraceSink, TracingSink};
pub use types::{
    IllegalDependencyDiagnostic, Severity, SourceSegment, TypeDependency,
    ILLEGAL_DEPENDENCY_CODE,
};
pub use validator::DependencyValidator;
