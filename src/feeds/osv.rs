//! OSV.dev dependency-vulnerability scanning client.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::FeedError;
use crate::finding::{Domain, Finding, Location, Severity};

const BASE_URL: &str = "https://api.osv.dev/v1/query";
const TIMEOUT: Duration = Duration::from_secs(15);

fn requirement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_\-.]+)\s*[=!<>~]{1,2}\s*([0-9][^\s;#]*)")
            .expect("static requirements.txt regex must compile")
    })
}

/// Parse `requirements.txt`-style lines into `(package, version)` pairs,
/// skipping blank, comment, and `-`-flag lines.
pub fn parse_requirements(manifest: &str) -> Vec<(String, String)> {
    manifest
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
        .filter_map(|l| {
            requirement_re()
                .captures(l)
                .map(|c| (c[1].to_string(), c[2].to_string()))
        })
        .collect()
}

#[derive(Deserialize)]
struct OsvResponse {
    #[serde(default)]
    vulns: Vec<OsvVuln>,
}

#[derive(Deserialize)]
struct OsvVuln {
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    database_specific: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OsvSeverity {
    #[serde(default)]
    score: String,
}

fn severity_from(vuln: &OsvVuln) -> Severity {
    let label = vuln
        .database_specific
        .as_ref()
        .and_then(|v| v.get("severity"))
        .and_then(|v| v.as_str())
        .map(str::to_uppercase);
    match label.as_deref() {
        Some("CRITICAL") => Severity::Critical,
        Some("HIGH") => Severity::High,
        Some("LOW") => Severity::Low,
        _ => Severity::Medium,
    }
}

pub struct OsvClient {
    client: reqwest::Client,
}

impl OsvClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Scan a `requirements.txt`-style manifest, returning one [`Finding`]
    /// per known vulnerability across all listed packages. Network and
    /// parse failures for an individual package are swallowed; they simply
    /// contribute no findings for that package.
    pub async fn scan_requirements(&self, manifest: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (package, version) in parse_requirements(manifest) {
            match self.query(&package, &version).await {
                Ok(vulns) => findings.extend(vulns),
                Err(e) => tracing::warn!(error = %e, package, "OSV query failed"),
            }
        }
        findings
    }

    async fn query(&self, package: &str, version: &str) -> Result<Vec<Finding>, FeedError> {
        let body = serde_json::json!({
            "version": version,
            "package": { "name": package, "ecosystem": "PyPI" },
        });
        let resp = self
            .client
            .post(BASE_URL)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(FeedError::from)?;
        let parsed: OsvResponse = resp.json().await.map_err(|e| FeedError::Parse(e.to_string()))?;

        Ok(parsed
            .vulns
            .iter()
            .map(|v| {
                let cve_refs: Vec<String> = v
                    .aliases
                    .iter()
                    .filter(|a| a.starts_with("CVE-"))
                    .cloned()
                    .collect();
                let cve_refs = if cve_refs.is_empty() { vec![v.id.clone()] } else { cve_refs };
                Finding::new(
                    Domain::Dependency,
                    "dependency_vulnerability",
                    severity_from(v),
                    format!("{package}@{version}: {}", v.id),
                    if v.summary.is_empty() {
                        format!("{package}@{version} is affected by {}.", v.id)
                    } else {
                        v.summary.clone()
                    },
                    Location::File { path: format!("{package}=={version}"), line: 0 },
                    v.id.clone(),
                    format!("Upgrade {package} past the version range affected by {}.", v.id),
                    1.0,
                )
                .with_cve_refs(cve_refs)
            })
            .collect())
    }
}

impl Default for OsvClient {
    fn default() -> Self {
        Self::new()
    }
}
