//! Memoizing dependency legality checks.

use crate::pattern::is_strict_ancestor;
use crate::rules::RuleSet;
use std::collections::HashMap;

/// Decides whether namespace dependencies are legal under a [`RuleSet`].
///
/// Verdicts are cached per `(from, to)` pair for the lifetime of the
/// validator, which is one analysis session.
#[derive(Debug)]
pub struct DependencyValidator {
    rules: RuleSet,
    cache: HashMap<(String, String), bool>,
    hits: u64,
    misses: u64,
}

impl DependencyValidator {
    /// Creates a validator with an empty cache.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the rule set this validator decides against.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns true if `from` may depend on `to`.
    pub fn is_allowed_dependency(&mut self, from: &str, to: &str) -> bool {
        let key = (from.to_owned(), to.to_owned());
        if let Some(&verdict) = self.cache.get(&key) {
            self.hits += 1;
            return verdict;
        }

        self.misses += 1;
        let verdict = self.evaluate(from, to);
        self.cache.insert(key, verdict);
        verdict
    }

    fn evaluate(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        if self.rules.child_can_depend_on_parent_implicitly() && is_strict_ancestor(to, from) {
            return true;
        }
        if self.rules.is_disallowed_by_rule(from, to) {
            return false;
        }
        // No matching rule means the dependency is illegal.
        self.rules.is_allowed_by_rule(from, to)
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub fn cache_hit_count(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that had to evaluate the rules.
    #[must_use]
    pub fn cache_miss_count(&self) -> u64 {
        self.misses
    }

    /// Share of lookups answered from the cache, in percent (0 before any lookup).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_efficiency_percent(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 * 100.0 / total as f64
    }
}
