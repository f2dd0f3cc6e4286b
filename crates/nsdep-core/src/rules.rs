//! Allow/disallow rule sets.

use crate::pattern::{NamespacePattern, PatternError};
use std::fmt;

/// A `from -> to` pair of namespace patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRule {
    from: NamespacePattern,
    to: NamespacePattern,
}

impl DependencyRule {
    /// Creates a rule from two patterns.
    #[must_use]
    pub fn new(from: NamespacePattern, to: NamespacePattern) -> Self {
        Self { from, to }
    }

    /// Parses a rule from two pattern strings.
    ///
    /// # Errors
    ///
    /// Returns error if either pattern is malformed.
    pub fn parse(from: &str, to: &str) -> Result<Self, PatternError> {
        Ok(Self::new(NamespacePattern::new(from)?, NamespacePattern::new(to)?))
    }

    /// A rule matching dependencies from any namespace into `to`.
    #[must_use]
    pub fn to_target(to: NamespacePattern) -> Self {
        Self::new(NamespacePattern::Any, to)
    }

    /// Returns the source-side pattern.
    #[must_use]
    pub fn from(&self) -> &NamespacePattern {
        &self.from
    }

    /// Returns the target-side pattern.
    #[must_use]
    pub fn to(&self) -> &NamespacePattern {
        &self.to
    }

    /// Tests whether the rule covers the `from -> to` dependency.
    #[must_use]
    pub fn matches(&self, from: &str, to: &str) -> bool {
        self.from.matches(from) && self.to.matches(to)
    }
}

impl fmt::Display for DependencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Immutable rule set for one analysis session.
///
/// Disallowed rules always take precedence over allowed rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    allowed: Vec<DependencyRule>,
    disallowed: Vec<DependencyRule>,
    child_can_depend_on_parent_implicitly: bool,
}

impl RuleSet {
    /// Creates a rule set.
    #[must_use]
    pub fn new(
        allowed: Vec<DependencyRule>,
        disallowed: Vec<DependencyRule>,
        child_can_depend_on_parent_implicitly: bool,
    ) -> Self {
        Self {
            allowed,
            disallowed,
            child_can_depend_on_parent_implicitly,
        }
    }

    /// Starts building a rule set.
    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Rules that permit a dependency.
    #[must_use]
    pub fn allowed(&self) -> &[DependencyRule] {
        &self.allowed
    }

    /// Rules that forbid a dependency.
    #[must_use]
    pub fn disallowed(&self) -> &[DependencyRule] {
        &self.disallowed
    }

    /// Whether a namespace may depend on its ancestors without a rule.
    #[must_use]
    pub fn child_can_depend_on_parent_implicitly(&self) -> bool {
        self.child_can_depend_on_parent_implicitly
    }

    /// True if any allowed rule covers the dependency.
    #[must_use]
    pub fn is_allowed_by_rule(&self, from: &str, to: &str) -> bool {
        self.allowed.iter().any(|r| r.matches(from, to))
    }

    /// True if any disallowed rule covers the dependency.
    #[must_use]
    pub fn is_disallowed_by_rule(&self, from: &str, to: &str) -> bool {
        self.disallowed.iter().any(|r| r.matches(from, to))
    }
}

/// Builder for [`RuleSet`] taking pattern strings.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    allowed: Vec<DependencyRule>,
    disallowed: Vec<DependencyRule>,
    child_can_depend_on_parent_implicitly: bool,
}

impl RuleSetBuilder {
    /// Adds an allowed `from -> to` rule.
    ///
    /// # Errors
    ///
    /// Returns error if either pattern is malformed.
    pub fn allow(mut self, from: &str, to: &str) -> Result<Self, PatternError> {
        self.allowed.push(DependencyRule::parse(from, to)?);
        Ok(self)
    }

    /// Adds a disallowed `from -> to` rule.
    ///
    /// # Errors
    ///
    /// Returns error if either pattern is malformed.
    pub fn disallow(mut self, from: &str, to: &str) -> Result<Self, PatternError> {
        self.disallowed.push(DependencyRule::parse(from, to)?);
        Ok(self)
    }

    /// Sets the implicit child-to-parent flag.
    #[must_use]
    pub fn child_can_depend_on_parent_implicitly(mut self, enabled: bool) -> Self {
        self.child_can_depend_on_parent_implicitly = enabled;
        self
    }

    /// Finishes the rule set.
    #[must_use]
    pub fn build(self) -> RuleSet {
        RuleSet::new(
            self.allowed,
            self.disallowed,
            self.child_can_depend_on_parent_implicitly,
        )
    }
}
