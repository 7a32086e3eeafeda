//! Sensitive-data-exposure probe: scans a single response body for
//! hardcoded credentials and card numbers returned by an API.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

struct Pattern {
    regex: fn() -> &'static Regex,
    title: &'static str,
    severity: Severity,
}

macro_rules! lazy_regex {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).expect("static exposure regex must compile"))
        }
    };
}

lazy_regex!(password_re, r#""password"\s*:\s*"[^"]+""#);
lazy_regex!(api_key_re, r#""api_key"\s*:\s*"[A-Za-z0-9_-]{32,}""#);
lazy_regex!(credit_card_re, r"[0-9]{4}-[0-9]{4}-[0-9]{4}-[0-9]{4}");
lazy_regex!(db_conn_re, r#"(?i)(?:database_url|connection_string)\s*:\s*"[^"]+""#);

const PATTERNS: &[Pattern] = &[
    Pattern { regex: password_re, title: "Hardcoded Password", severity: Severity::Critical },
    Pattern { regex: api_key_re, title: "API Key Exposure", severity: Severity::High },
    Pattern { regex: credit_card_re, title: "Credit Card Number", severity: Severity::Critical },
    Pattern { regex: db_conn_re, title: "Database Connection String", severity: Severity::High },
];

pub struct SensitiveDataExposureProbe;

#[async_trait]
impl Probe for SensitiveDataExposureProbe {
    fn name(&self) -> &'static str {
        "Sensitive Data Exposure (API)"
    }

    fn module_id(&self) -> &'static str {
        "probes.sensitive_data_exposure"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let Ok(resp) = client.get(target_url).send().await else { return Vec::new() };
        let Ok(body) = resp.text().await else { return Vec::new() };

        let mut findings = Vec::new();
        for pattern in PATTERNS {
            let Some(m) = (pattern.regex)().find(&body) else { continue };
            findings.push(
                Finding::new(
                    Domain::ThreatIntel,
                    "info_leak",
                    pattern.severity,
                    format!("Insecure Data Exposure: {}", pattern.title),
                    "Sensitive information was found in the API response or public page content.",
                    Location::Url { url: target_url.to_string(), parameter: pattern.title.to_string() },
                    format!("Matched pattern: {}", m.as_str().chars().take(50).collect::<String>()),
                    "Never return sensitive data in API responses or public pages. Mask fields \
                     or keep the logic backend-only.",
                    0.85,
                )
                .with_cve_refs(vec!["CWE-200".to_string(), "CWE-312".to_string()]),
            );
        }
        findings
    }
}
