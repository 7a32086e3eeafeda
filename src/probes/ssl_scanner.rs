//! SSL/TLS configuration probe: flags plaintext HTTP and weak negotiated
//! TLS protocol versions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_rustls::{rustls, TlsConnector};

use crate::finding::{Domain, Finding, Location, Severity};

use super::{Probe, ProbeConfig};

pub struct SslScannerProbe;

#[async_trait]
impl Probe for SslScannerProbe {
    fn name(&self) -> &'static str {
        "SSL/TLS Configuration Security"
    }

    fn module_id(&self) -> &'static str {
        "probes.ssl_scanner"
    }

    async fn run(&self, target_url: &str, _config: &ProbeConfig) -> Vec<Finding> {
        let Ok(parsed) = url::Url::parse(target_url) else { return Vec::new() };
        let Some(host) = parsed.host_str() else { return Vec::new() };

        if parsed.scheme() != "https" {
            return vec![Finding::new(
                Domain::ThreatIntel,
                "missing_tls",
                Severity::High,
                "Insecure HTTP Protocol",
                "The target application is accessible over unencrypted HTTP.",
                Location::Url { url: target_url.to_string(), parameter: "scheme".to_string() },
                "Protocol scheme is 'http'.",
                "Implement TLS (HTTPS) and enforce HSTS (HTTP Strict Transport Security).",
                0.95,
            )
            .with_cve_refs(vec!["CWE-319".to_string()])];
        }

        let port = parsed.port().unwrap_or(443);
        let Some(version) = negotiated_version(host, port).await else { return Vec::new() };

        if version == rustls::ProtocolVersion::TLSv1_0 || version == rustls::ProtocolVersion::TLSv1_1 {
            vec![Finding::new(
                Domain::ThreatIntel,
                "weak_ssl_config",
                Severity::Medium,
                "Weak TLS Version Supported",
                format!("The server supports an outdated and insecure TLS version: {version:?}."),
                Location::Url {
                    url: format!("{host}:{port}"),
                    parameter: "tls_version".to_string(),
                },
                format!("Negotiated TLS version: {version:?}"),
                "Disable TLS 1.0/1.1 support. Enforce TLS 1.2 or 1.3 as the minimum protocol version.",
                0.9,
            )
            .with_cve_refs(vec!["CWE-327".to_string()])]
        } else {
            Vec::new()
        }
    }
}

async fn negotiated_version(host: &str, port: u16) -> Option<rustls::ProtocolVersion> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let mut client_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    client_config.alpn_protocols.clear();
    let connector = TlsConnector::from(Arc::new(client_config));

    let stream = TcpStream::connect((host, port)).await.ok()?;
    let server_name = rustls::pki_types::ServerName::try_from(host.to_string()).ok()?;
    let tls_stream = connector.connect(server_name, stream).await.ok()?;
    let (_, session) = tls_stream.get_ref();
    session.protocol_version()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plaintext_http_is_flagged() {
        let probe = SslScannerProbe;
        let findings = probe.run("http://example.com", &ProbeConfig::default()).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].finding_type, "missing_tls");
    }

    #[tokio::test]
    async fn test_malformed_url_yields_no_findings() {
        let probe = SslScannerProbe;
        let findings = probe.run("not a url", &ProbeConfig::default()).await;
        assert!(findings.is_empty());
    }
}
