//! The scan coordinator's unified output: every finding, the aggregated
//! risk verdict, and the compliance matrix for a single scan (§3, §4.10).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceVerdict;
use crate::finding::{Finding, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RiskLevel::Critical
        } else if score >= 50.0 {
            RiskLevel::High
        } else if score >= 25.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: String,
    pub input_hash: String,
    pub findings: Vec<Finding>,
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    pub compliance: Vec<ComplianceVerdict>,
    /// Distinct remediation strings, ranked by the highest-severity
    /// finding they address, most urgent first.
    pub remediation_summary: Vec<String>,
    pub audit_record_hash: String,
}

impl ScanResult {
    pub fn critical_count(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::Critical).count()
    }

    pub fn high_count(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::High).count()
    }

    /// Distinct PII entity types observed, derived from finding metadata.
    pub fn pii_types_found(&self) -> BTreeSet<String> {
        self.findings
            .iter()
            .filter_map(|f| match f.metadata.get("entity_type") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the ranked remediation summary (§4.10 step 8): group findings by
/// their exact remediation string, keep the highest severity weight seen
/// per group, sort descending, and keep the top `limit`.
pub fn rank_remediation_summary(findings: &[Finding], limit: usize) -> Vec<String> {
    let mut by_remediation: Vec<(String, u32)> = Vec::new();
    for f in findings {
        let weight = f.severity.weight();
        match by_remediation.iter_mut().find(|(r, _)| r == &f.remediation) {
            Some((_, w)) if *w < weight => *w = weight,
            Some(_) => {}
            None => by_remediation.push((f.remediation.clone(), weight)),
        }
    }
    by_remediation.sort_by(|a, b| b.1.cmp(&a.1));
    by_remediation.into_iter().take(limit).map(|(r, _)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Domain, Location};

    fn finding(remediation: &str, severity: Severity) -> Finding {
        Finding::new(
            Domain::CodeSecurity,
            "t",
            severity,
            "title",
            "desc",
            Location::File { path: "a.py".into(), line: 1 },
            "ev",
            remediation,
            0.9,
        )
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(5.0), RiskLevel::Low);
    }

    #[test]
    fn test_remediation_summary_ranks_by_max_severity_then_truncates() {
        let findings = vec![
            finding("rotate secret", Severity::Critical),
            finding("sanitize input", Severity::Medium),
            finding("rotate secret", Severity::Low),
        ];
        let summary = rank_remediation_summary(&findings, 8);
        assert_eq!(summary[0], "rotate secret");
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_remediation_summary_respects_limit() {
        let findings: Vec<Finding> = (0..10)
            .map(|i| finding(&format!("fix {i}"), Severity::Low))
            .collect();
        let summary = rank_remediation_summary(&findings, 8);
        assert_eq!(summary.len(), 8);
    }
}
