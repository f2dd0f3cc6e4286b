//! Sources of type dependency facts.
//!
//! Parsing source code is the job of an external analyzer. The
//! [`TypeDependencyEnumerator`] trait is the seam where such an analyzer
//! plugs in.

use crate::trace::TraceSink;
use crate::types::TypeDependency;
use std::path::{Path, PathBuf};

/// Errors raised while enumerating dependencies.
#[derive(Debug, thiserror::Error)]
pub enum EnumeratorError {
    /// Failed to read an input file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },
    /// A fact line could not be decoded.
    #[error("{path}:{line}: invalid dependency fact: {message}")]
    InvalidFact {
        /// Fact file containing the line.
        path: PathBuf,
        /// Line number (1-indexed).
        line: usize,
        /// Decoder message.
        message: String,
    },
}

/// Emits the namespace dependencies found in a set of source files.
pub trait TypeDependencyEnumerator: Send + Sync {
    /// Short name used in trace output.
    fn name(&self) -> &'static str;

    /// Returns every dependency found in `source_files`, in source order.
    ///
    /// # Errors
    ///
    /// Returns error if an input cannot be read or decoded.
    fn enumerate(
        &self,
        source_files: &[PathBuf],
        referenced_assemblies: &[PathBuf],
        trace: &dyn TraceSink,
    ) -> Result<Vec<TypeDependency>, EnumeratorError>;
}

/// Default suffix of fact files written next to source files.
pub const DEFAULT_FACT_SUFFIX: &str = ".deps.jsonl";

/// Reads dependency facts that an external analyzer wrote beside each
/// source file, one JSON [`TypeDependency`] per line.
///
/// For `src/Foo.cs` the facts are read from `src/Foo.cs.deps.jsonl`.
/// Source files without a fact file contribute no dependencies.
#[derive(Debug, Clone)]
pub struct FactFileEnumerator {
    suffix: String,
}

impl FactFileEnumerator {
    /// Creates an enumerator using [`DEFAULT_FACT_SUFFIX`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_suffix(DEFAULT_FACT_SUFFIX)
    }

    /// Creates an enumerator reading `<source><suffix>` files.
    #[must_use]
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Fact file path for a source file.
    #[must_use]
    pub fn fact_path(&self, source: &Path) -> PathBuf {
        let mut name = source.as_os_str().to_owned();
        name.push(&self.suffix);
        PathBuf::from(name)
    }

    fn read_facts(&self, source: &Path) -> Result<Vec<TypeDependency>, EnumeratorError> {
        let fact_path = self.fact_path(source);
        let content = std::fs::read_to_string(&fact_path).map_err(|e| EnumeratorError::Io {
            path: fact_path.clone(),
            source: e,
        })?;

        let mut facts = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut dep: TypeDependency =
                serde_json::from_str(line).map_err(|e| EnumeratorError::InvalidFact {
                    path: fact_path.clone(),
                    line: i + 1,
                    message: e.to_string(),
                })?;
            if dep.source_segment.path.is_none() {
                dep.source_segment.path = Some(source.to_path_buf());
            }
            facts.push(dep);
        }
        Ok(facts)
    }
}

impl Default for FactFileEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDependencyEnumerator for FactFileEnumerator {
    fn name(&self) -> &'static str {
        "fact-file"
    }

    fn enumerate(
        &self,
        source_files: &[PathBuf],
        _referenced_assemblies: &[PathBuf],
        trace: &dyn TraceSink,
    ) -> Result<Vec<TypeDependency>, EnumeratorError> {
        let mut all = Vec::new();
        for source in source_files {
            if !self.fact_path(source).exists() {
                trace.trace(&format!("No dependency facts for {}", source.display()));
                continue;
            }
            all.extend(self.read_facts(source)?);
        }
        Ok(all)
    }
}
