//! Reflected XSS probe: payload-reflection detection.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, with_param, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "\"><script>alert('XSS')</script>",
    "';alert('XSS');",
    "<img src=x onerror=alert('XSS')>",
];

const DEFAULT_PARAMS: &[&str] = &["q", "id", "search", "name"];

pub struct XssProbe;

#[async_trait]
impl Probe for XssProbe {
    fn name(&self) -> &'static str {
        "Cross-Site Scripting (XSS)"
    }

    fn module_id(&self) -> &'static str {
        "probes.xss"
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
                let test_url = with_param(target_url, param, payload);
                let Ok(resp) = client.get(&test_url).send().await else { continue };
                let Ok(body) = resp.text().await else { continue };
                if body.contains(payload) {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "reflected_xss",
                            Severity::High,
                            "Reflected XSS Detected",
                            format!(
                                "The application reflects input from the '{param}' parameter \
                                 without proper sanitization."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Payload found verbatim in response: {payload}"),
                            "Use context-aware output encoding and a strong Content-Security-Policy.",
                            0.88,
                        )
                        .with_cve_refs(vec!["CWE-79".to_string()]),
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
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_detects_reflected_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html>results for <script>alert('XSS')</script></html>",
            ))
            .mount(&server)
            .await;

        let probe = XssProbe;
        let config = ProbeConfig { params: vec!["q".to_string()], ..Default::default() };
        let findings = probe.run(&server.uri(), &config).await;
        assert!(!findings.is_empty());
        assert_eq!(findings[0].finding_type, "reflected_xss");
    }

    #[tokio::test]
    async fn test_unreflected_input_yields_no_findings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nothing interesting"))
            .mount(&server)
            .await;

        let probe = XssProbe;
        let config = ProbeConfig { params: vec!["q".to_string()], ..Default::default() };
        let findings = probe.run(&server.uri(), &config).await;
        assert!(findings.is_empty());
    }
}
