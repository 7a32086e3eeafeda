//! The universal output unit: [`Finding`], plus severity, domain, and
//! deduplication support.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher as _};

use crate::entropy::fingerprint;

/// Risk domain a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    CodeSecurity,
    PromptInjection,
    PiiExposure,
    ThreatIntel,
    Dependency,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Domain::CodeSecurity => "code-security",
            Domain::PromptInjection => "prompt-injection",
            Domain::PiiExposure => "pii-exposure",
            Domain::ThreatIntel => "threat-intel",
            Domain::Dependency => "dependency",
        };
        write!(f, "{s}")
    }
}

/// Severity, ordered so that `Critical > High > Medium > Low > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight used by risk-score accumulation (§4.4, §4.10's remediation
    /// ranking).
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a finding was observed: a source file and line, a character offset,
/// or a URL and the parameter that triggered a dynamic probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    File { path: String, line: u32 },
    Offset { source: String, offset: usize },
    Url { url: String, parameter: String },
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::File { path, line } => write!(f, "{path}:{line}"),
            Location::Offset { source, offset } => write!(f, "{source}@{offset}"),
            Location::Url { url, parameter } => write!(f, "{url}#{parameter}"),
        }
    }
}

/// A single security observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Stable id: a fingerprint hash of `(finding_type, evidence, location)`.
    pub id: String,
    pub domain: Domain,
    /// Stable short name, e.g. `"hardcoded_secret"`, `"sql_injection"`.
    pub finding_type: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub location: Location,
    /// Masked or truncated snippet — never carries unredacted secret bytes
    /// beyond the first and last four characters.
    pub evidence: String,
    pub remediation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cve_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owasp_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mitre_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Finding {
    /// Build a finding, computing its stable id from type + evidence + location.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        domain: Domain,
        finding_type: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        location: Location,
        evidence: impl Into<String>,
        remediation: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let finding_type = finding_type.into();
        let evidence = evidence.into();
        let location_str = location.to_string();
        let id = fingerprint(&finding_type, &evidence, &location_str);
        Self {
            id,
            domain,
            finding_type,
            severity,
            title: title.into(),
            description: description.into(),
            location,
            evidence,
            remediation: remediation.into(),
            suggested_fix: None,
            confidence,
            cve_refs: Vec::new(),
            owasp_refs: Vec::new(),
            mitre_refs: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    pub fn with_cve_refs(mut self, refs: Vec<String>) -> Self {
        self.cve_refs = refs;
        self
    }

    pub fn with_owasp_refs(mut self, refs: Vec<String>) -> Self {
        self.owasp_refs = refs;
        self
    }

    pub fn with_mitre_refs(mut self, refs: Vec<String>) -> Self {
        self.mitre_refs = refs;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Deduplicates findings by id, keeping the first occurrence.
pub fn deduplicate(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert(f.id.clone()))
        .collect()
}

/// Stable ordering for a returned `ScanResult`: severity descending, then
/// domain, then id lexicographic (§5 "Ordering guarantees").
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| domain_rank(a.domain).cmp(&domain_rank(b.domain)))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn domain_rank(d: Domain) -> u8 {
    match d {
        Domain::CodeSecurity => 0,
        Domain::PromptInjection => 1,
        Domain::PiiExposure => 2,
        Domain::ThreatIntel => 3,
        Domain::Dependency => 4,
    }
}

/// Cheap, stable hash of arbitrary text — used for input fingerprinting
/// where a full SHA-256 isn't warranted (e.g. cache-key components that are
/// already namespaced by a SHA-256 elsewhere).
pub(crate) fn quick_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(severity: Severity) -> Finding {
        Finding::new(
            Domain::CodeSecurity,
            "test_finding",
            severity,
            "Test",
            "desc",
            Location::File { path: "a.py".into(), line: 1 },
            "evidence",
            "fix it",
            0.9,
        )
    }

    #[test]
    fn test_id_stable_for_same_inputs() {
        let a = sample(Severity::High);
        let b = sample(Severity::High);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_id_differs_on_location() {
        let a = sample(Severity::High);
        let mut b = sample(Severity::High);
        b.location = Location::File { path: "b.py".into(), line: 1 };
        b.id = fingerprint(&b.finding_type, &b.evidence, &b.location.to_string());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_deduplicate_collapses_identical_ids() {
        let findings = vec![sample(Severity::High), sample(Severity::High)];
        assert_eq!(deduplicate(findings).len(), 1);
    }

    #[test]
    fn test_sort_orders_by_severity_then_domain_then_id() {
        let mut findings = vec![sample(Severity::Low), sample(Severity::Critical)];
        sort_findings(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
    }
}
