//! Broken Object Level Authorization (BOLA) probe: sibling-resource access
//! via API-path ID substitution.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/(?:[a-zA-Z0-9_-]+/)?(\d+|[0-9a-fA-F]{8}-(?:[0-9a-fA-F]{4}-){3}[0-9a-fA-F]{12})")
            .expect("static BOLA id-pattern regex must compile")
    })
}

pub struct BolaProbe;

#[async_trait]
impl Probe for BolaProbe {
    fn name(&self) -> &'static str {
        "Broken Object Level Authorization (BOLA)"
    }

    fn module_id(&self) -> &'static str {
        "probes.bola"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let Some(caps) = id_pattern().captures_iter(target_url).last() else { return Vec::new() };
        let original_id = caps.get(1).unwrap().as_str().to_string();

        let test_ids: Vec<String> = if let Ok(n) = original_id.parse::<i64>() {
            vec![(n - 1).to_string(), (n + 1).to_string(), "1".to_string(), "0".to_string()]
        } else {
            vec![
                "00000000-0000-0000-0000-000000000000".to_string(),
                "11111111-1111-1111-1111-111111111111".to_string(),
            ]
        };

        let client = http_client(config);
        let Ok(original_resp) = client.get(target_url).send().await else { return Vec::new() };
        let Ok(original_body) = original_resp.text().await else { return Vec::new() };

        let mut findings = Vec::new();
        for test_id in test_ids {
            if test_id == original_id {
                continue;
            }
            let test_url = target_url.replacen(&original_id, &test_id, 1);
            let Ok(resp) = client.get(&test_url).send().await else { continue };
            let status = resp.status();
            let Ok(body) = resp.text().await else { continue };

            if status.is_success() && (body.len() as i64 - original_body.len() as i64).abs() < 500 {
                findings.push(
                    Finding::new(
                        Domain::ThreatIntel,
                        "bola",
                        Severity::High,
                        "BOLA / Broken Object Level Authorization",
                        format!(
                            "The API endpoint appears to allow unauthorized access to resource \
                             ID '{test_id}', which differs from the requested object."
                        ),
                        Location::Url { url: test_url, parameter: "path_id".to_string() },
                        format!("Successful response accessing sibling resource ID '{test_id}'."),
                        "Check user authorization for every object requested. Enforce \
                         object-level permissions via middleware or gateway.",
                        0.8,
                    )
                    .with_cve_refs(vec!["CWE-639".to_string(), "CWE-285".to_string()]),
                );
                break;
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_pattern_extracts_trailing_numeric_id() {
        let caps = id_pattern().captures_iter("https://api.example.com/v1/users/123").last().unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "123");
    }

    #[tokio::test]
    async fn test_url_without_id_yields_no_findings() {
        let probe = BolaProbe;
        let findings = probe.run("https://example.com/health", &ProbeConfig::default()).await;
        assert!(findings.is_empty());
    }
}
