//! Human-readable and machine-readable report rendering for a [`ScanResult`].
//!
//! The markdown layout follows the teacher's severity-grouped findings
//! table, extended with the risk/compliance/remediation/audit sections a
//! unified multi-domain scan needs.

use crate::compliance::ComplianceStatus;
use crate::finding::{Finding, Severity};
use crate::result::ScanResult;

const SEVERITY_ORDER: [Severity; 5] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
    Severity::Info,
];

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::High => "High",
        Severity::Medium => "Medium",
        Severity::Low => "Low",
        Severity::Info => "Info",
    }
}

fn status_icon(status: ComplianceStatus) -> &'static str {
    match status {
        ComplianceStatus::Compliant => "\u{2705}",
        ComplianceStatus::Partial => "\u{26a0}\u{fe0f}",
        ComplianceStatus::NonCompliant => "\u{274c}",
    }
}

/// Render a full markdown report for a scan result.
pub fn to_markdown(result: &ScanResult, title: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {title}\n\n"));

    out.push_str("## Risk Summary\n\n");
    out.push_str(&format!(
        "Overall risk score: **{:.1}/100** ({})\n\n",
        result.overall_risk_score, result.risk_level,
    ));
    out.push_str("| Severity | Count |\n|---|---|\n");
    for severity in SEVERITY_ORDER {
        let count = result.findings.iter().filter(|f| f.severity == severity).count();
        if count > 0 {
            out.push_str(&format!("| {} | {count} |\n", severity_label(severity)));
        }
    }
    out.push_str(&format!("| **Total** | **{}** |\n\n", result.findings.len()));

    out.push_str("## Compliance\n\n");
    out.push_str("| Framework | Status | Score |\n|---|---|---|\n");
    for verdict in &result.compliance {
        out.push_str(&format!(
            "| {} | {} {:?} | {:.0} |\n",
            verdict.framework,
            status_icon(verdict.status),
            verdict.status,
            verdict.score,
        ));
    }
    out.push('\n');

    out.push_str("## Findings\n\n");
    if result.findings.is_empty() {
        out.push_str("No findings detected.\n\n");
    } else {
        for severity in SEVERITY_ORDER {
            let group: Vec<&Finding> = result
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .collect();
            if group.is_empty() {
                continue;
            }
            out.push_str(&format!("### {}\n\n", severity_label(severity)));
            for finding in group {
                out.push_str(&format!("#### {}\n\n", finding.title));
                out.push_str(&format!("**Location:** `{}`\n\n", finding.location));
                out.push_str(&format!(
                    "**Scanner:** {} | **Confidence:** {}%\n\n",
                    finding.finding_type,
                    (finding.confidence * 100.0).round() as u32,
                ));
                out.push_str(&format!("{}\n\n", finding.description));
                if !finding.cve_refs.is_empty() || !finding.owasp_refs.is_empty() || !finding.mitre_refs.is_empty() {
                    let mut refs = Vec::new();
                    refs.extend(finding.cve_refs.iter().cloned());
                    refs.extend(finding.owasp_refs.iter().cloned());
                    refs.extend(finding.mitre_refs.iter().cloned());
                    out.push_str(&format!("**References:** {}\n\n", refs.join(", ")));
                }
                out.push_str(&format!("**Fix:** {}\n\n", finding.remediation));
                out.push_str("---\n\n");
            }
        }
    }

    if !result.remediation_summary.is_empty() {
        out.push_str("## Top Remediation Actions\n\n");
        for (i, action) in result.remediation_summary.iter().enumerate() {
            out.push_str(&format!("{}. {action}\n", i + 1));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Chain hash: {}...\n",
        &result.audit_record_hash[..result.audit_record_hash.len().min(16)],
    ));

    out
}

/// Render a scan result as pretty-printed JSON.
pub fn to_json(result: &ScanResult) -> Result<String, serde_json::Error> {
    result.to_json()
}
