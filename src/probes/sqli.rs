//! SQL Injection probe: error-based detection via database error signatures.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, with_param, Probe, ProbeConfig};

const PAYLOADS: &[&str] = &["'", "''", "\"", "admin'--", "1' OR '1'='1"];

const ERROR_SIGNATURES: &[&str] = &[
    "sql syntax",
    "mysql_fetch",
    "postgresql",
    "sqlite/jdbcdriver",
    "microsoft ole db provider for sql server",
    "ora-00933",
];

const DEFAULT_PARAMS: &[&str] = &["id", "user", "cat", "page"];

pub struct SqliProbe;

#[async_trait]
impl Probe for SqliProbe {
    fn name(&self) -> &'static str {
        "SQL Injection"
    }

    fn module_id(&self) -> &'static str {
        "probes.sqli"
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
                if ERROR_SIGNATURES.iter().any(|sig| lower.contains(sig)) {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "sql_injection",
                            Severity::Critical,
                            "Error-based SQL Injection suspected",
                            format!(
                                "A database error signature was detected in the response when \
                                 injecting the '{param}' parameter."
                            ),
                            Location::Url { url: test_url, parameter: param.to_string() },
                            format!("Payload `{payload}` triggered an apparent SQL error in response."),
                            "Use parameterized queries for all database interactions. Validate \
                             input and limit database user permissions.",
                            0.9,
                        )
                        .with_cve_refs(vec!["CWE-89".to_string()]),
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
    async fn test_detects_sql_error_signature() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(500).set_body_string("You have an error in your SQL syntax"))
            .mount(&server)
            .await;

        let probe = SqliProbe;
        let config = ProbeConfig { params: vec!["id".to_string()], ..Default::default() };
        let findings = probe.run(&format!("{}/items", server.uri()), &config).await;
        assert!(!findings.is_empty());
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_clean_response_yields_no_findings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let probe = SqliProbe;
        let config = ProbeConfig { params: vec!["id".to_string()], ..Default::default() };
        let findings = probe.run(&format!("{}/items", server.uri()), &config).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_target_returns_empty_not_error() {
        let probe = SqliProbe;
        let config = ProbeConfig::default();
        let findings = probe.run("http://127.0.0.1:1", &config).await;
        assert!(findings.is_empty());
    }
}
