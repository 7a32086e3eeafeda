//! Insecure Direct Object Reference (IDOR) probe: numeric-ID query-parameter
//! manipulation.

use async_trait::async_trait;
use regex::Regex;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

const DEFAULT_PARAMS: &[&str] = &["id", "user_id", "project_id"];

pub struct IdorProbe;

#[async_trait]
impl Probe for IdorProbe {
    fn name(&self) -> &'static str {
        "Insecure Direct Object Reference (IDOR)"
    }

    fn module_id(&self) -> &'static str {
        "probes.idor"
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
            if !target_url.contains(&format!("{param}=")) {
                continue;
            }
            let Ok(re) = Regex::new(&format!(r"{param}=(\d+)", param = regex::escape(param))) else {
                continue;
            };
            let Some(caps) = re.captures(target_url) else { continue };
            let Ok(current_id) = caps.get(1).unwrap().as_str().parse::<i64>() else { continue };

            let Ok(original_resp) = client.get(target_url).send().await else { continue };
            let Ok(original_body) = original_resp.text().await else { continue };

            for test_id in [current_id - 1, current_id + 1, 1, 100] {
                if test_id < 0 {
                    continue;
                }
                let test_url =
                    target_url.replace(&format!("{param}={current_id}"), &format!("{param}={test_id}"));
                let Ok(resp) = client.get(&test_url).send().await else { continue };
                let status = resp.status();
                let Ok(body) = resp.text().await else { continue };

                if status.is_success() && (body.len() as i64 - original_body.len() as i64).abs() < 500 {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "idor",
                            Severity::High,
                            "Potential IDOR Vulnerability",
                            format!(
                                "Directly modifying the numerical resource identifier '{param}' \
                                 yielded a successful response, potentially exposing unauthorized data."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!(
                                "Access to ID {test_id} was successful and structurally similar \
                                 to the primary ID."
                            ),
                            "Implement object-level access control checks. Use non-sequential \
                             UUIDs for resource identifiers.",
                            0.8,
                        )
                        .with_cve_refs(vec!["CWE-639".to_string()]),
                    );
                    break;
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url_without_matching_param_yields_no_findings() {
        let probe = IdorProbe;
        let config = ProbeConfig { params: vec!["id".to_string()], ..Default::default() };
        let findings = probe.run("https://example.com/health", &config).await;
        assert!(findings.is_empty());
    }
}
