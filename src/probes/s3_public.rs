//! AWS S3 public-bucket probe.

use async_trait::async_trait;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

pub struct S3PublicProbe;

#[async_trait]
impl Probe for S3PublicProbe {
    fn name(&self) -> &'static str {
        "AWS S3 Public Bucket Detection"
    }

    fn module_id(&self) -> &'static str {
        "probes.s3_public"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        if !(target_url.contains("s3.amazonaws.com") || target_url.contains("s3-")) {
            return Vec::new();
        }
        let client = http_client(config);
        let Ok(resp) = client.get(target_url).send().await else { return Vec::new() };
        let Ok(body) = resp.text().await else { return Vec::new() };

        if body.contains("<ListBucketResult") {
            vec![Finding::new(
                Domain::ThreatIntel,
                "s3_public_bucket",
                Severity::Critical,
                "Publicly Accessible S3 Bucket",
                "The target S3 bucket allows public listing of its contents, potentially \
                 exposing sensitive files.",
                Location::Url { url: target_url.to_string(), parameter: "bucket".to_string() },
                "ListBucketResult XML signature found in root response.",
                "Enable 'Block Public Access' at the bucket and account level. Use IAM and \
                 bucket policies to restrict access.",
                0.95,
            )
            .with_cve_refs(vec!["CWE-284".to_string()])]
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
    async fn test_public_bucket_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ListBucketResult></ListBucketResult>"))
            .mount(&server)
            .await;

        let probe = S3PublicProbe;
        let url = format!("{}/?s3-bucket", server.uri());
        let findings = probe.run(&url, &ProbeConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_non_s3_url_is_skipped_without_request() {
        let probe = S3PublicProbe;
        let findings = probe.run("https://example.com/app", &ProbeConfig::default()).await;
        assert!(findings.is_empty());
    }
}
