//! Remote Code Execution / command-injection probe.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, with_param, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &["$(whoami)", "`id`", "; cat /etc/passwd", "| ping -c 1 127.0.0.1", "& ipconfig /all"];

const SIGNATURES: &[&str] = &["root:x:0:0", "uid=", "Windows IP Configuration"];

const DEFAULT_PARAMS: &[&str] = &["cmd", "exec", "shell", "run", "query"];

pub struct RceProbe;

#[async_trait]
impl Probe for RceProbe {
    fn name(&self) -> &'static str {
        "Remote Code Execution (RCE)"
    }

    fn module_id(&self) -> &'static str {
        "probes.rce"
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
                            "remote_code_execution",
                            Severity::Critical,
                            "Command Injection / RCE Detected",
                            format!(
                                "The application appears to execute shell commands provided in \
                                 the '{param}' parameter."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Command output detected in response for payload: {payload}"),
                            "Avoid executing system commands based on user input. If unavoidable, \
                             use strict allowlists and escape all input.",
                            0.92,
                        )
                        .with_cve_refs(vec!["CWE-78".to_string(), "CWE-94".to_string()]),
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
    async fn test_command_output_signature_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("uid=0(root) gid=0(root)"))
            .mount(&server)
            .await;

        let probe = RceProbe;
        let config = ProbeConfig { params: vec!["cmd".to_string()], ..Default::default() };
        let findings = probe.run(&server.uri(), &config).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }
}
