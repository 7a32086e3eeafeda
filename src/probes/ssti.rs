//! Server-Side Template Injection probe: confirms arithmetic-expression
//! evaluation across common template engines.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, with_param, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &["{{7*7}}", "${7*7}", "<%= 7*7 %>", "#{7*7}"];

const DEFAULT_PARAMS: &[&str] = &["name", "title", "msg", "template"];

pub struct SstiProbe;

#[async_trait]
impl Probe for SstiProbe {
    fn name(&self) -> &'static str {
        "Server-Side Template Injection (SSTI)"
    }

    fn module_id(&self) -> &'static str {
        "probes.ssti"
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
                if body.contains("49") {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "ssti",
                            Severity::Critical,
                            "Server-Side Template Injection Detected",
                            format!(
                                "The application evaluates template expressions in the '{param}' parameter."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Mathematical expression {payload} evaluated to 49 in response."),
                            "Never pass user input directly into template engines. Use sandboxed \
                             rendering or predefined templates with placeholders.",
                            0.85,
                        )
                        .with_cve_refs(vec!["CWE-1336".to_string(), "CWE-94".to_string()]),
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
    async fn test_evaluated_expression_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("result: 49"))
            .mount(&server)
            .await;

        let probe = SstiProbe;
        let config = ProbeConfig { params: vec!["name".to_string()], ..Default::default() };
        let findings = probe.run(&server.uri(), &config).await;
        assert_eq!(findings.len(), 1);
    }
}
