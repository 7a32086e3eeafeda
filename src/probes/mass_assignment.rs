//! Mass-assignment probe: tries writing admin-like fields via POST/PATCH/PUT.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

pub struct MassAssignmentProbe;

#[async_trait]
impl Probe for MassAssignmentProbe {
    fn name(&self) -> &'static str {
        "API Mass Assignment Detection"
    }

    fn module_id(&self) -> &'static str {
        "probes.mass_assignment"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let payload = json!({"role": "admin", "is_admin": true, "admin": 1, "status": "active"});

        for method in [Method::POST, Method::PATCH, Method::PUT] {
            let Ok(resp) = client.request(method.clone(), target_url).json(&payload).send().await else {
                continue;
            };
            let status = resp.status().as_u16();
            if matches!(status, 200 | 201 | 204) {
                return vec![
                    Finding::new(
                        Domain::ThreatIntel,
                        "mass_assignment",
                        Severity::High,
                        format!("Potential Mass Assignment ({method})"),
                        "The API endpoint appears to accept administrative fields like 'role' \
                         or 'is_admin' without strict validation.",
                        Location::Url { url: target_url.to_string(), parameter: method.to_string() },
                        format!("Success status {status} when sending sensitive fields in JSON payload."),
                        "Implement strict DTOs and only permit allowlisted fields on write models.",
                        0.75,
                    )
                    .with_cve_refs(vec!["CWE-915".to_string()]),
                ];
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_accepted_admin_fields_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let probe = MassAssignmentProbe;
        let findings = probe.run(&server.uri(), &ProbeConfig::default()).await;
        assert_eq!(findings.len(), 1);
    }
}
