//! Subdomain-takeover probe: matches known dangling-CNAME error fingerprints.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

struct Fingerprint {
    service: &'static str,
    message: &'static str,
    severity: Severity,
}

const FINGERPRINTS: &[Fingerprint] = &[
    Fingerprint { service: "GitHub Pages", message: "there isn't a github pages site here", severity: Severity::High },
    Fingerprint { service: "Heroku", message: "no such app", severity: Severity::High },
    Fingerprint { service: "Fastly", message: "fastly error: unknown domain", severity: Severity::Medium },
    Fingerprint { service: "AWS S3", message: "the specified bucket does not exist", severity: Severity::High },
];

pub struct SubdomainTakeoverProbe;

#[async_trait]
impl Probe for SubdomainTakeoverProbe {
    fn name(&self) -> &'static str {
        "Subdomain Takeover Detection"
    }

    fn module_id(&self) -> &'static str {
        "probes.subdomain_takeover"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let Ok(resp) = client.get(target_url).send().await else { return Vec::new() };
        let Ok(body) = resp.text().await else { return Vec::new() };
        let lower = body.to_lowercase();

        FINGERPRINTS
            .iter()
            .filter(|fp| lower.contains(fp.message))
            .map(|fp| {
                Finding::new(
                    Domain::ThreatIntel,
                    "subdomain_takeover",
                    fp.severity,
                    format!("Potential {} Subdomain Takeover", fp.service),
                    format!(
                        "The subdomain appears to point to a {} resource that has been deleted, \
                         but the DNS record remains.",
                        fp.service
                    ),
                    Location::Url { url: target_url.to_string(), parameter: "dns".to_string() },
                    format!("Service signature found in response: '{}'", fp.message),
                    "Remove the stale CNAME/Alias pointing to the deleted resource, or claim the \
                     resource name on the provider.",
                    0.8,
                )
                .with_cve_refs(vec!["CWE-912".to_string()])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_heroku_fingerprint_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("No such app"))
            .mount(&server)
            .await;

        let probe = SubdomainTakeoverProbe;
        let findings = probe.run(&server.uri(), &ProbeConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Potential Heroku Subdomain Takeover");
    }
}
