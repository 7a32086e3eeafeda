//! Server-Side Request Forgery probe: forces the target to fetch attacker-
//! chosen URLs, including cloud-metadata endpoints, and inspects the
//! response for signs the fetch actually happened server-side.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, with_param, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &[
    "http://localhost",
    "http://127.0.0.1",
    "http://169.254.169.254/latest/meta-data/",
    "http://metadata.google.internal/computeMetadata/v1/",
];

const METADATA_SIGNATURES: &[&str] = &["meta-data", "instance-id", "computemetadata"];

const DEFAULT_PARAMS: &[&str] = &["url", "dest", "uri", "path", "api"];

pub struct SsrfProbe;

#[async_trait]
impl Probe for SsrfProbe {
    fn name(&self) -> &'static str {
        "Server-Side Request Forgery (SSRF)"
    }

    fn module_id(&self) -> &'static str {
        "probes.ssrf"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let params: &[String] = &config.params;
        let params: Vec<&str> = if params.is_empty() {
            DEFAULT_PARAMS.to_vec()
        } else {
            params.iter().map(|s| s.as_str()).collect()
        };

        let mut findings = Vec::new();
        for param in params {
            for payload in PAYLOADS {
                let test_url = with_param(target_url, param, payload);
                let Ok(resp) = client.get(&test_url).send().await else { continue };
                let Ok(body) = resp.text().await else { continue };
                let lower = body.to_lowercase();
                if METADATA_SIGNATURES.iter().any(|sig| lower.contains(sig)) {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "ssrf_cloud_metadata",
                            Severity::Critical,
                            "Potential SSRF via Cloud Metadata",
                            format!(
                                "The application appears to fetch content from an internal \
                                 cloud metadata service via the '{param}' parameter."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Metadata signature found in response to payload `{payload}`."),
                            "Implement a strict allowlist of allowed protocols and domains. Do \
                             not allow requests to internal or loopback addresses.",
                            0.9,
                        )
                        .with_cve_refs(vec!["CWE-918".to_string()]),
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
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_detects_metadata_signature_in_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ami-id\ninstance-id\nlocal-hostname"))
            .mount(&server)
            .await;

        let probe = SsrfProbe;
        let config = ProbeConfig { params: vec!["url".to_string()], ..Default::default() };
        let findings = probe.run(&format!("{}/fetch", server.uri()), &config).await;
        assert!(!findings.is_empty());
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].finding_type, "ssrf_cloud_metadata");
    }

    #[tokio::test]
    async fn test_clean_response_yields_no_findings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let probe = SsrfProbe;
        let config = ProbeConfig { params: vec!["url".to_string()], ..Default::default() };
        let findings = probe.run(&format!("{}/fetch", server.uri()), &config).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_target_returns_empty_not_error() {
        let probe = SsrfProbe;
        let config = ProbeConfig::default();
        let findings = probe.run("http://127.0.0.1:1", &config).await;
        assert!(findings.is_empty());
    }
}
