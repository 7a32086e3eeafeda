//! Open-redirect probe: checks whether a redirect-style parameter lands
//! verbatim in the `Location` response header.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, with_param, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &[
    "https://evil.com",
    "//evil.com",
    "/\\evil.com",
    "https://trusted.example@evil.com",
];

const DEFAULT_PARAMS: &[&str] = &["url", "redirect", "next", "goto", "return"];

pub struct OpenRedirectProbe;

#[async_trait]
impl Probe for OpenRedirectProbe {
    fn name(&self) -> &'static str {
        "Open Redirect"
    }

    fn module_id(&self) -> &'static str {
        "probes.open_redirect"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| http_client(config));
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
                if !matches!(resp.status().as_u16(), 301 | 302 | 303 | 307 | 308) {
                    continue;
                }
                let location = resp
                    .headers()
                    .get("Location")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if location.contains(payload) {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "open_redirect",
                            Severity::Medium,
                            "Open Redirect Detected",
                            format!(
                                "The application redirects users to an arbitrary external URL \
                                 from the '{param}' parameter."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Redirect Location header: {location}"),
                            "Use an internal allowlist for redirect destinations rather than \
                             full attacker-controlled URLs.",
                            0.85,
                        )
                        .with_cve_refs(vec!["CWE-601".to_string()]),
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
    async fn test_attacker_controlled_redirect_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "https://evil.com"))
            .mount(&server)
            .await;

        let probe = OpenRedirectProbe;
        let config = ProbeConfig { params: vec!["url".to_string()], ..Default::default() };
        let findings = probe.run(&server.uri(), &config).await;
        assert_eq!(findings.len(), 1);
    }
}
