//! PII Analyzer: regex-backed entity detection, an optional pluggable NLP
//! backend, and the diminishing-returns risk formula from §4.5.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::config::PiiBackend;
use crate::finding::{Domain, Finding, Location, Severity};

/// Per-entity weighting and compliance tags, mirroring the richer entity
/// catalog (§4.5): weight drives the risk score, `gdpr` classifies Article-5
/// exposure severity, and `hipaa`/`pci` mark frameworks this entity alone
/// can trip.
struct EntityProfile {
    entity_type: &'static str,
    weight: f64,
    gdpr: &'static str,
    hipaa: bool,
    pci: bool,
}

const PROFILES: &[EntityProfile] = &[
    EntityProfile { entity_type: "EMAIL_ADDRESS", weight: 10.0, gdpr: "high", hipaa: false, pci: false },
    EntityProfile { entity_type: "PHONE_NUMBER", weight: 10.0, gdpr: "high", hipaa: false, pci: false },
    EntityProfile { entity_type: "PERSON", weight: 8.0, gdpr: "medium", hipaa: false, pci: false },
    EntityProfile { entity_type: "LOCATION", weight: 5.0, gdpr: "medium", hipaa: false, pci: false },
    EntityProfile { entity_type: "US_SSN", weight: 25.0, gdpr: "critical", hipaa: true, pci: false },
    EntityProfile { entity_type: "CREDIT_CARD", weight: 30.0, gdpr: "critical", hipaa: false, pci: true },
    EntityProfile { entity_type: "IBAN_CODE", weight: 30.0, gdpr: "critical", hipaa: false, pci: true },
    EntityProfile { entity_type: "IP_ADDRESS", weight: 5.0, gdpr: "medium", hipaa: false, pci: false },
    EntityProfile { entity_type: "US_PASSPORT", weight: 20.0, gdpr: "high", hipaa: true, pci: false },
    EntityProfile { entity_type: "US_DRIVER_LICENSE", weight: 15.0, gdpr: "high", hipaa: true, pci: false },
    EntityProfile { entity_type: "AWS_ACCESS_KEY", weight: 35.0, gdpr: "critical", hipaa: false, pci: false },
];

fn profile(entity_type: &str) -> &'static EntityProfile {
    PROFILES
        .iter()
        .find(|p| p.entity_type == entity_type)
        .expect("entity_type must come from detect_regex, which only emits known profiles")
}

struct EntityPattern {
    entity_type: &'static str,
    regex: fn() -> &'static Regex,
}

macro_rules! lazy_regex {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).expect("static PII regex must compile"))
        }
    };
}

lazy_regex!(email_re, r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}");
lazy_regex!(phone_re, r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b");
lazy_regex!(ssn_re, r"\b\d{3}-\d{2}-\d{4}\b");
lazy_regex!(credit_card_re, r"\b(?:\d[ -]*?){13,16}\b");
lazy_regex!(iban_re, r"\b[A-Z]{2}\d{2}[A-Z0-9]{10,30}\b");
lazy_regex!(ip_re, r"\b(?:\d{1,3}\.){3}\d{1,3}\b");
lazy_regex!(aws_key_re, r"\bAKIA[0-9A-Z]{16}\b");
lazy_regex!(passport_re, r"\b[A-Z]{1,2}\d{6,9}\b");
lazy_regex!(driver_license_re, r"\b[A-Z]\d{7,8}\b");

const PATTERNS: &[EntityPattern] = &[
    EntityPattern { entity_type: "EMAIL_ADDRESS", regex: email_re },
    EntityPattern { entity_type: "PHONE_NUMBER", regex: phone_re },
    EntityPattern { entity_type: "US_SSN", regex: ssn_re },
    EntityPattern { entity_type: "CREDIT_CARD", regex: credit_card_re },
    EntityPattern { entity_type: "IBAN_CODE", regex: iban_re },
    EntityPattern { entity_type: "IP_ADDRESS", regex: ip_re },
    EntityPattern { entity_type: "AWS_ACCESS_KEY", regex: aws_key_re },
    EntityPattern { entity_type: "US_PASSPORT", regex: passport_re },
    EntityPattern { entity_type: "US_DRIVER_LICENSE", regex: driver_license_re },
];

/// Optional injected NLP entity recognizer (e.g. a wrapped named-entity
/// model). The PII Analyzer falls back to the regex catalog transparently
/// when none is supplied, mirroring the original's auto-fallback when its
/// NLP model isn't available.
pub trait NlpEntityRecognizer: Send + Sync {
    /// Return `(entity_type, matched_text, start_offset, confidence)` tuples.
    fn recognize(&self, text: &str) -> Vec<(&'static str, String, usize, f32)>;
}

pub struct PiiAnalyzer<'a> {
    backend: PiiBackend,
    nlp: Option<&'a dyn NlpEntityRecognizer>,
}

impl<'a> PiiAnalyzer<'a> {
    pub fn new(backend: PiiBackend, nlp: Option<&'a dyn NlpEntityRecognizer>) -> Self {
        Self { backend, nlp }
    }

    fn detect_regex(text: &str, source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            for pattern in PATTERNS {
                for m in (pattern.regex)().find_iter(line) {
                    let p = profile(pattern.entity_type);
                    findings.push(Self::build_finding(
                        p,
                        m.as_str(),
                        Location::File { path: source.to_string(), line: (line_no + 1) as u32 },
                        0.82,
                    ));
                }
            }
        }
        findings
    }

    fn detect_nlp(
        nlp: &dyn NlpEntityRecognizer,
        text: &str,
        source: &str,
    ) -> Vec<Finding> {
        let mut grouped: HashMap<&'static str, Vec<(String, usize, f32)>> = HashMap::new();
        for (entity_type, matched, offset, confidence) in nlp.recognize(text) {
            grouped.entry(entity_type).or_default().push((matched, offset, confidence));
        }

        let mut findings = Vec::new();
        for (entity_type, matches) in grouped {
            let p = profile(entity_type);
            let mean_confidence =
                matches.iter().map(|(_, _, c)| *c).sum::<f32>() / matches.len().max(1) as f32;
            for (matched, offset, _) in matches {
                findings.push(Self::build_finding(
                    p,
                    &matched,
                    Location::Offset { source: source.to_string(), offset },
                    mean_confidence,
                ));
            }
        }
        findings
    }

    fn build_finding(p: &EntityProfile, matched: &str, location: Location, confidence: f32) -> Finding {
        let severity = if p.gdpr == "critical" { Severity::Critical } else { Severity::High };
        let evidence = crate::entropy::mask_secret(matched);
        let mut frameworks = vec!["GDPR".to_string()];
        if p.hipaa {
            frameworks.push("HIPAA".to_string());
        }
        if p.pci {
            frameworks.push("PCI-DSS".to_string());
        }
        Finding::new(
            Domain::PiiExposure,
            "pii_detected",
            severity,
            format!("PII Detected: {}", p.entity_type),
            format!(
                "A {} was found in the scanned text, which may trigger {} obligations.",
                p.entity_type,
                frameworks.join("/")
            ),
            location,
            evidence,
            "Redact, tokenize, or remove this data before storage or transmission.",
            confidence,
        )
        .with_metadata("entity_type", serde_json::Value::String(p.entity_type.to_string()))
        .with_owasp_refs(frameworks)
    }

    pub fn scan(&self, text: &str, source: &str) -> Vec<Finding> {
        match (self.backend, self.nlp) {
            (PiiBackend::Nlp, Some(nlp)) => Self::detect_nlp(nlp, text, source),
            _ => Self::detect_regex(text, source),
        }
    }

    fn risk_score(findings: &[Finding]) -> f64 {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for f in findings {
            let Some(serde_json::Value::String(entity)) = f.metadata.get("entity_type") else {
                continue;
            };
            *counts.entry(entity.clone()).or_insert(0) += 1;
        }
        let mut total = 0.0;
        for (entity_type, count) in counts {
            let p = profile(&entity_type);
            total += (p.weight * count as f64).min(p.weight * 3.0);
        }
        total.min(100.0)
    }
}

/// Replace every regex-detected PII span in `text` with its masked form,
/// independent of building findings. Used by the engine's `anonymize` entry
/// point, which only wants a redacted echo of the input.
pub fn anonymize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let mut spans: Vec<(usize, usize)> = Vec::new();
        for pattern in PATTERNS {
            for m in (pattern.regex)().find_iter(line) {
                spans.push((m.start(), m.end()));
            }
        }
        spans.sort_by_key(|s| s.0);
        let mut cursor = 0;
        for (start, end) in spans {
            if start < cursor {
                continue;
            }
            out.push_str(&line[cursor..start]);
            out.push_str(&crate::entropy::mask_secret(&line[start..end]));
            cursor = end;
        }
        out.push_str(&line[cursor..]);
    }
    out
}

impl super::Analyzer for PiiAnalyzer<'_> {
    fn name(&self) -> &'static str {
        "pii"
    }

    fn analyze(&self, input: &str, context: &super::AnalyzerContext) -> (Vec<Finding>, f64) {
        let findings = self.scan(input, &context.source);
        let score = Self::risk_score(&findings);
        (findings, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_detected() {
        let analyzer = PiiAnalyzer::new(PiiBackend::Regex, None);
        let findings = analyzer.scan("contact: jane.doe@example.com\n", "data.txt");
        assert!(findings.iter().any(|f| f.metadata.get("entity_type")
            == Some(&serde_json::Value::String("EMAIL_ADDRESS".into()))));
    }

    #[test]
    fn test_ssn_is_critical_severity() {
        let analyzer = PiiAnalyzer::new(PiiBackend::Regex, None);
        let findings = analyzer.scan("ssn: 123-45-6789\n", "data.txt");
        let f = findings
            .iter()
            .find(|f| f.metadata.get("entity_type") == Some(&serde_json::Value::String("US_SSN".into())))
            .unwrap();
        assert_eq!(f.severity, Severity::Critical);
    }

    #[test]
    fn test_risk_score_diminishing_returns() {
        let text = "a@b.com\nc@d.com\ne@f.com\ng@h.com\ni@j.com\n";
        let analyzer = PiiAnalyzer::new(PiiBackend::Regex, None);
        let findings = analyzer.scan(text, "data.txt");
        let score = PiiAnalyzer::risk_score(&findings);
        // weight 10, capped at weight*3 = 30 regardless of 5 matches.
        assert_eq!(score, 30.0);
    }

    #[test]
    fn test_nlp_backend_falls_back_to_regex_without_recognizer() {
        let analyzer = PiiAnalyzer::new(PiiBackend::Nlp, None);
        let findings = analyzer.scan("jane.doe@example.com\n", "data.txt");
        assert!(!findings.is_empty());
    }

    #[test]
    fn test_masked_evidence_does_not_expose_full_value() {
        let analyzer = PiiAnalyzer::new(PiiBackend::Regex, None);
        let findings = analyzer.scan("ssn: 123-45-6789\n", "data.txt");
        assert!(!findings[0].evidence.contains("123-45-6789"));
    }

    #[test]
    fn test_anonymize_masks_detected_spans_and_preserves_surrounding_text() {
        let masked = anonymize("contact jane.doe@example.com for details\n");
        assert!(!masked.contains("jane.doe@example.com"));
        assert!(masked.starts_with("contact "));
        assert!(masked.ends_with("for details\n"));
    }

    #[test]
    fn test_anonymize_is_a_no_op_on_clean_text() {
        assert_eq!(anonymize("nothing sensitive here\n"), "nothing sensitive here\n");
    }
}
