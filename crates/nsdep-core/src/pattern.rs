//! Namespace patterns over dotted namespace names.

use std::fmt;

/// Errors raised when a namespace pattern is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Pattern string is empty.
    #[error("namespace pattern cannot be empty")]
    Empty,
    /// Pattern contains an empty segment (`A..B`, `.A`, `A.`).
    #[error("namespace pattern '{pattern}' has an empty segment")]
    EmptySegment {
        /// The rejected pattern.
        pattern: String,
    },
    /// A `*` appears somewhere other than the final segment.
    #[error("namespace pattern '{pattern}': '*' is only allowed as the last segment")]
    MisplacedWildcard {
        /// The rejected pattern.
        pattern: String,
    },
}

/// A validated namespace pattern.
///
/// - `A.B` matches exactly `A.B`.
/// - `A.*` matches every strict descendant of `A` (`A.B`, `A.B.C`) but not `A`.
/// - `*` matches any namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamespacePattern {
    /// Matches every namespace.
    Any,
    /// Matches a single namespace.
    Exact(String),
    /// Matches all descendants of the stored prefix.
    Descendants(String),
}

impl NamespacePattern {
    /// Parses a pattern string.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty, has empty segments, or uses
    /// `*` anywhere but the last segment.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if pattern == "*" {
            return Ok(Self::Any);
        }

        let (prefix, wildcard) = match pattern.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (pattern, false),
        };

        for segment in prefix.split('.') {
            if segment.is_empty() {
                return Err(PatternError::EmptySegment {
                    pattern: pattern.to_string(),
                });
            }
            if segment.contains('*') {
                return Err(PatternError::MisplacedWildcard {
                    pattern: pattern.to_string(),
                });
            }
        }

        if wildcard {
            Ok(Self::Descendants(prefix.to_string()))
        } else {
            Ok(Self::Exact(prefix.to_string()))
        }
    }

    /// Tests whether a namespace name matches this pattern.
    #[must_use]
    pub fn matches(&self, namespace: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(name) => namespace == name,
            Self::Descendants(prefix) => is_strict_ancestor(prefix, namespace),
        }
    }
}

impl fmt::Display for NamespacePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Exact(name) => write!(f, "{name}"),
            Self::Descendants(prefix) => write!(f, "{prefix}.*"),
        }
    }
}

impl std::str::FromStr for NamespacePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Returns true if `ancestor` is a strict dotted prefix of `namespace`
/// (`A.B` is an ancestor of `A.B.C`; `A.B` is not an ancestor of `A.BC`).
#[must_use]
pub fn is_strict_ancestor(ancestor: &str, namespace: &str) -> bool {
    namespace
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1)
}
