//! NoSQL Injection probe: operator-injection payloads via query parameters.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &[r#"{"$gt": ""}"#, r#"{"$ne": null}"#, "[$ne]=1", "[$gt]="];

const SIGNATURES: &[&str] = &["mongodb", "not authorized", "undefined", "bson"];

const DEFAULT_PARAMS: &[&str] = &["user", "id", "search", "filter"];

pub struct NosqliProbe;

#[async_trait]
impl Probe for NosqliProbe {
    fn name(&self) -> &'static str {
        "NoSQL Injection"
    }

    fn module_id(&self) -> &'static str {
        "probes.nosqli"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let params: Vec<&str> = if config.params.is_empty() {
            DEFAULT_PARAMS.to_vec()
        } else {
            config.params.iter().map(|s| s.as_str()).collect()
        };

        let mut findings = Vec::new();
        for param in params {
            for payload in PAYLOADS {
                let sep = if target_url.contains('?') { '&' } else { '?' };
                let test_url = format!("{target_url}{sep}{param}{payload}");
                let Ok(resp) = client.get(&test_url).send().await else { continue };
                let Ok(body) = resp.text().await else { continue };
                let lower = body.to_lowercase();
                if SIGNATURES.iter().any(|sig| lower.contains(sig)) {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "nosql_injection",
                            Severity::High,
                            "Potential NoSQL Injection",
                            format!(
                                "The application appears vulnerable to NoSQL injection in the \
                                 '{param}' parameter."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Database-specific response for payload: {payload}"),
                            "Use an ORM/ODM that handles sanitization, or manually validate all \
                             NoSQL operators.",
                            0.8,
                        )
                        .with_cve_refs(vec!["CWE-943".to_string()]),
                    );
                    break;
                }
            }
        }
        findings
    }
}
