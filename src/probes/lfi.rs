//! Local File Inclusion / path-traversal probe.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, with_param, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &[
    "/etc/passwd",
    "../../../../etc/passwd",
    "..\\..\\..\\..\\windows\\win.ini",
    "C:\\windows\\win.ini",
];

const SIGNATURES: &[&str] = &["root:x:0:0", "[extensions]", "[fonts]", "bit 16"];

const DEFAULT_PARAMS: &[&str] = &["file", "path", "page", "include", "view"];

pub struct LfiProbe;

#[async_trait]
impl Probe for LfiProbe {
    fn name(&self) -> &'static str {
        "Local File Inclusion (LFI) / Path Traversal"
    }

    fn module_id(&self) -> &'static str {
        "probes.lfi"
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
                if SIGNATURES.iter().any(|sig| body.contains(sig)) {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "local_file_inclusion",
                            Severity::High,
                            "LFI / Path Traversal Detected",
                            format!(
                                "The application appears to allow arbitrary file reading through \
                                 the '{param}' parameter."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Sensitive file content detected in response for payload: {payload}"),
                            "Never use user-provided paths directly in file-system operations. \
                             Use a predefined allowlist of files.",
                            0.85,
                        )
                        .with_cve_refs(vec!["CWE-22".to_string(), "CWE-98".to_string()]),
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
    async fn test_passwd_signature_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("root:x:0:0:root:/root:/bin/bash"))
            .mount(&server)
            .await;

        let probe = LfiProbe;
        let config = ProbeConfig { params: vec!["file".to_string()], ..Default::default() };
        let findings = probe.run(&server.uri(), &config).await;
        assert_eq!(findings.len(), 1);
    }
}
