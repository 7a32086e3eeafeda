//! GraphQL probe: introspection exposure and unbounded query batching.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

const INTROSPECTION_QUERY: &str = r#"{"query": "{__schema{queryType{name}}}"}"#;
const BATCH_PAYLOAD: &str = r#"[{"query":"query{__typename}"}, {"query":"query{__typename}"}]"#;

pub struct GraphqlProbe;

#[async_trait]
impl Probe for GraphqlProbe {
    fn name(&self) -> &'static str {
        "GraphQL Security Testing"
    }

    fn module_id(&self) -> &'static str {
        "probes.graphql"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let mut findings = Vec::new();

        if let Ok(resp) = client
            .post(target_url)
            .header("Content-Type", "application/json")
            .body(INTROSPECTION_QUERY)
            .send()
            .await
        {
            if let Ok(body) = resp.text().await {
                if body.contains("queryType") {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "information_disclosure",
                            Severity::Low,
                            "GraphQL Introspection Enabled",
                            "The GraphQL API permits schema introspection, which reveals all \
                             available queries, mutations, and types to anyone.",
                            Location::Url { url: target_url.to_string(), parameter: "introspection".to_string() },
                            "Introspection query returned schema metadata.",
                            "Disable introspection in production environments.",
                            0.9,
                        )
                        .with_cve_refs(vec!["CWE-200".to_string()]),
                    );
                }
            }
        }

        if let Ok(resp) = client
            .post(target_url)
            .header("Content-Type", "application/json")
            .body(BATCH_PAYLOAD)
            .send()
            .await
        {
            if let Ok(json) = resp.json::<serde_json::Value>().await {
                if json.as_array().map(|a| a.len()) == Some(2) {
                    findings.push(
                        Finding::new(
                            Domain::ThreatIntel,
                            "resource_exhaustion",
                            Severity::Medium,
                            "GraphQL Query Batching Enabled",
                            "The API allows batching multiple queries in a single request, which \
                             can be used for denial-of-service or brute-force attacks.",
                            Location::Url { url: target_url.to_string(), parameter: "batching".to_string() },
                            "Request with 2 batched queries yielded 2 results.",
                            "Limit the number of batched operations allowed per request, or \
                             disable batching if not required.",
                            0.8,
                        )
                        .with_cve_refs(vec!["CWE-770".to_string()]),
                    );
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
    async fn test_introspection_enabled_detected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{"__schema":{"queryType":{"name":"Query"}}}}"#))
            .mount(&server)
            .await;

        let probe = GraphqlProbe;
        let findings = probe.run(&server.uri(), &ProbeConfig::default()).await;
        assert!(findings.iter().any(|f| f.finding_type == "information_disclosure"));
    }
}
