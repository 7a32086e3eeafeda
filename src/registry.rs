//! Pattern Registry: holds all rules shared by the static analyzers.

use regex::Regex;
use std::collections::HashMap;

use crate::error::ScanError;
use crate::finding::{Domain, Severity};

/// A compiled rule: regex pattern plus the metadata needed to turn a match
/// into a [`crate::finding::Finding`].
#[derive(Clone)]
pub struct Rule {
    pub label: String,
    pub domain: Domain,
    pub finding_type: String,
    pub severity: Severity,
    pub pattern: Regex,
    pub cwe_refs: Vec<String>,
    /// Minimum Shannon entropy (bits/char) the matched token must meet. `None`
    /// means no entropy gate.
    pub min_entropy: Option<f64>,
}

impl Rule {
    #[allow(clippy::too_many_arguments)]
    pub fn compile(
        label: impl Into<String>,
        domain: Domain,
        finding_type: impl Into<String>,
        severity: Severity,
        pattern: &str,
        cwe_refs: Vec<String>,
        min_entropy: Option<f64>,
    ) -> Result<Self, ScanError> {
        let label = label.into();
        let regex = Regex::new(pattern).map_err(|e| ScanError::RuleCompileFailed {
            rule_id: label.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            label,
            domain,
            finding_type: finding_type.into(),
            severity,
            pattern: regex,
            cwe_refs,
            min_entropy,
        })
    }
}

/// Holds all rules, grouped by domain and ordered by severity descending.
///
/// Registration is a startup-time, single-threaded operation (rule pattern
/// compilation failure is fatal, per §4.1); after that the registry is
/// read-only and requires no locking, so it is exposed as a plain value
/// rather than wrapped in a mutex.
pub struct PatternRegistry {
    by_domain: HashMap<Domain, Vec<Rule>>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self { by_domain: HashMap::new() }
    }

    /// Register a rule. Rules within a domain are kept ordered severity
    /// descending so the first match for a given text is the strongest.
    pub fn register(&mut self, rule: Rule) {
        let bucket = self.by_domain.entry(rule.domain).or_default();
        let idx = bucket.partition_point(|r| r.severity >= rule.severity);
        bucket.insert(idx, rule);
    }

    pub fn rules_for(&self, domain: Domain) -> &[Rule] {
        self.by_domain.get(&domain).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.by_domain.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_domain.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_rules_for() {
        let mut reg = PatternRegistry::new();
        reg.register(
            Rule::compile(
                "test",
                Domain::CodeSecurity,
                "test_finding",
                Severity::High,
                "foo",
                vec![],
                None,
            )
            .unwrap(),
        );
        assert_eq!(reg.rules_for(Domain::CodeSecurity).len(), 1);
        assert_eq!(reg.rules_for(Domain::PiiExposure).len(), 0);
    }

    #[test]
    fn test_severity_descending_order() {
        let mut reg = PatternRegistry::new();
        reg.register(
            Rule::compile("low", Domain::CodeSecurity, "a", Severity::Low, "a", vec![], None).unwrap(),
        );
        reg.register(
            Rule::compile("crit", Domain::CodeSecurity, "b", Severity::Critical, "b", vec![], None)
                .unwrap(),
        );
        let rules = reg.rules_for(Domain::CodeSecurity);
        assert_eq!(rules[0].severity, Severity::Critical);
        assert_eq!(rules[1].severity, Severity::Low);
    }

    #[test]
    fn test_invalid_pattern_fails_to_compile() {
        let result = Rule::compile(
            "bad",
            Domain::CodeSecurity,
            "bad",
            Severity::Low,
            "(unclosed",
            vec![],
            None,
        );
        assert!(result.is_err());
    }
}
