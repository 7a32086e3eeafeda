//! Compliance Matrix: maps a finding set plus overall risk score onto a
//! verdict for each regulatory/standards framework (§4.9).

use serde::{Deserialize, Serialize};

use crate::finding::{Domain, Finding, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    Partial,
    NonCompliant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    pub framework: String,
    pub status: ComplianceStatus,
    pub score: f64,
    pub violations: Vec<String>,
}

fn pii_findings(findings: &[Finding]) -> Vec<&Finding> {
    findings.iter().filter(|f| f.domain == Domain::PiiExposure).collect()
}

fn has_type(findings: &[Finding], finding_type: &str) -> bool {
    findings.iter().any(|f| f.finding_type == finding_type)
}

fn entity_is(f: &Finding, entity: &str) -> bool {
    matches!(f.metadata.get("entity_type"), Some(serde_json::Value::String(s)) if s == entity)
}

/// GDPR Article 5 (unlawful processing) and Article 32 (security of
/// processing).
fn gdpr(findings: &[Finding]) -> ComplianceVerdict {
    let mut violations = Vec::new();
    if !pii_findings(findings).is_empty() {
        violations.push("Article 5: personal data detected without demonstrated lawful basis".to_string());
    }
    if has_type(findings, "ssl_disabled") || has_type(findings, "hardcoded_secret") {
        violations.push("Article 32: inadequate security of processing".to_string());
    }
    let score = (100.0 - violations.len() as f64 * 25.0).max(0.0);
    verdict("GDPR", score, violations)
}

/// EU AI Act Annex III (high-risk systems) and Article 5 (prohibited
/// practices).
fn ai_act(findings: &[Finding], overall_score: f64) -> ComplianceVerdict {
    let mut violations = Vec::new();
    if overall_score > 75.0 {
        violations.push("Annex III: system risk score exceeds the high-risk threshold".to_string());
    }
    let critical_prompt_injection = findings
        .iter()
        .any(|f| f.domain == Domain::PromptInjection && f.severity == Severity::Critical);
    if critical_prompt_injection {
        violations.push("Article 5: evidence of a prohibited manipulative practice".to_string());
    }
    let penalty = violations.len() as f64 * 30.0 + if overall_score > 75.0 { 10.0 } else { 0.0 };
    let score = (100.0 - penalty).max(0.0);
    verdict("AI Act", score, violations)
}

/// HIPAA: protected health information exposure and sensitive-data logging.
fn hipaa(findings: &[Finding]) -> ComplianceVerdict {
    let phi_entities = ["EMAIL_ADDRESS", "PHONE_NUMBER", "PERSON", "US_SSN"];
    let mut violations = Vec::new();
    let has_phi = pii_findings(findings)
        .iter()
        .any(|f| phi_entities.iter().any(|e| entity_is(f, e)))
        || findings.iter().any(|f| {
            matches!(f.metadata.get("entity_type"), Some(serde_json::Value::String(s))
                if s == "US_PASSPORT" || s == "US_DRIVER_LICENSE" || s == "MEDICAL_LICENSE")
        });
    if has_phi {
        violations.push("Protected health information exposed without safeguards".to_string());
    }
    if has_type(findings, "sensitive_data_logged") {
        violations.push("Sensitive data written to logs".to_string());
    }
    let score = (100.0 - violations.len() as f64 * 30.0).max(0.0);
    verdict("HIPAA", score, violations)
}

/// PCI-DSS: cardholder-data exposure, disabled TLS, and weak hashing.
fn pci_dss(findings: &[Finding]) -> ComplianceVerdict {
    let mut violations = Vec::new();
    let has_card = pii_findings(findings)
        .iter()
        .any(|f| entity_is(f, "CREDIT_CARD") || entity_is(f, "IBAN_CODE"));
    if has_card {
        violations.push("Cardholder data detected outside an approved storage context".to_string());
    }
    if has_type(findings, "ssl_disabled") {
        violations.push("TLS verification disabled on a code path handling payment data".to_string());
    }
    if has_type(findings, "weak_hash") {
        violations.push("Weak hash algorithm used where cardholder data may be hashed".to_string());
    }
    let score = (100.0 - violations.len() as f64 * 35.0).max(0.0);
    verdict("PCI-DSS", score, violations)
}

/// SOC 2: any critical finding or a hardcoded secret trips the security
/// trust-services criterion.
fn soc2(findings: &[Finding]) -> ComplianceVerdict {
    let critical: Vec<&Finding> = findings.iter().filter(|f| f.severity == Severity::Critical).collect();
    let mut violations = Vec::new();
    if !critical.is_empty() {
        violations.push("Critical-severity finding present".to_string());
    }
    if has_type(findings, "hardcoded_secret") {
        violations.push("Hardcoded credential present".to_string());
    }
    let score = (100.0 - violations.len() as f64 * 20.0 - critical.len() as f64 * 4.0).max(0.0);
    verdict("SOC2", score, violations)
}

/// NIST AI RMF: status is bucketed purely on the overall score.
fn nist_ai_rmf(overall_score: f64) -> ComplianceVerdict {
    let status = if overall_score < 25.0 {
        ComplianceStatus::Compliant
    } else if overall_score < 60.0 {
        ComplianceStatus::Partial
    } else {
        ComplianceStatus::NonCompliant
    };
    let score = (100.0 - overall_score * 0.8).max(0.0);
    ComplianceVerdict {
        framework: "NIST AI RMF".to_string(),
        status,
        score,
        violations: Vec::new(),
    }
}

/// OWASP Top 10 for LLM Applications: any prompt-injection finding, or any
/// finding that already carries an OWASP reference, trips this framework.
fn owasp_llm(findings: &[Finding]) -> ComplianceVerdict {
    let mut violations = Vec::new();
    if findings.iter().any(|f| f.domain == Domain::PromptInjection) {
        violations.push("LLM01: Prompt Injection finding present".to_string());
    }
    if findings.iter().any(|f| !f.owasp_refs.is_empty()) {
        violations.push("A finding maps to an OWASP Top 10 category".to_string());
    }
    let score = (100.0 - violations.len() as f64 * 25.0).max(0.0);
    verdict("OWASP LLM Top 10", score, violations)
}

fn verdict(framework: &str, score: f64, violations: Vec<String>) -> ComplianceVerdict {
    let status = if violations.is_empty() {
        ComplianceStatus::Compliant
    } else {
        ComplianceStatus::NonCompliant
    };
    ComplianceVerdict { framework: framework.to_string(), status, score: score.max(0.0), violations }
}

/// Assess every framework named in §4.9, returning one verdict each.
pub fn assess_all(findings: &[Finding], overall_score: f64) -> Vec<ComplianceVerdict> {
    vec![
        gdpr(findings),
        ai_act(findings, overall_score),
        hipaa(findings),
        pci_dss(findings),
        soc2(findings),
        nist_ai_rmf(overall_score),
        owasp_llm(findings),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Location;

    fn pii_finding(entity: &str) -> Finding {
        Finding::new(
            Domain::PiiExposure,
            "pii_detected",
            Severity::High,
            "PII",
            "desc",
            Location::File { path: "a.py".into(), line: 1 },
            "ev",
            "fix",
            0.9,
        )
        .with_metadata("entity_type", serde_json::Value::String(entity.to_string()))
    }

    #[test]
    fn test_clean_scan_is_compliant_everywhere() {
        let verdicts = assess_all(&[], 0.0);
        assert!(verdicts.iter().all(|v| v.status == ComplianceStatus::Compliant));
    }

    #[test]
    fn test_gdpr_flags_any_pii() {
        let findings = vec![pii_finding("EMAIL_ADDRESS")];
        let verdicts = assess_all(&findings, 10.0);
        let gdpr = verdicts.iter().find(|v| v.framework == "GDPR").unwrap();
        assert_eq!(gdpr.status, ComplianceStatus::NonCompliant);
        assert_eq!(gdpr.score, 75.0);
    }

    #[test]
    fn test_pci_dss_flags_credit_card() {
        let findings = vec![pii_finding("CREDIT_CARD")];
        let verdicts = assess_all(&findings, 10.0);
        let pci = verdicts.iter().find(|v| v.framework == "PCI-DSS").unwrap();
        assert_eq!(pci.status, ComplianceStatus::NonCompliant);
        assert_eq!(pci.score, 65.0);
    }

    #[test]
    fn test_nist_ai_rmf_is_score_bucketed() {
        let verdicts = assess_all(&[], 80.0);
        let nist = verdicts.iter().find(|v| v.framework == "NIST AI RMF").unwrap();
        assert_eq!(nist.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_owasp_llm_flags_prompt_injection() {
        let finding = Finding::new(
            Domain::PromptInjection,
            "jailbreak",
            Severity::High,
            "t",
            "d",
            Location::Offset { source: "p".into(), offset: 0 },
            "ev",
            "fix",
            0.9,
        );
        let verdicts = assess_all(&[finding], 20.0);
        let owasp = verdicts.iter().find(|v| v.framework == "OWASP LLM Top 10").unwrap();
        assert_eq!(owasp.status, ComplianceStatus::NonCompliant);
    }
}
