//! Dynamic probe modules: stateless, async, HTTP-based checks run against a
//! live target URL.
//!
//! Each probe implements [`Probe`] and registers itself in [`registry`] —
//! a compile-time factory-function table. The orchestrator iterates this
//! registry; there is no filesystem or reflection-based module discovery.

pub mod bola;
pub mod csrf;
pub mod graphql;
pub mod idor;
pub mod lfi;
pub mod mass_assignment;
pub mod nosqli;
pub mod open_redirect;
pub mod orchestrator;
pub mod rce;
pub mod s3_public;
pub mod sensitive_data_exposure;
pub mod sqli;
pub mod ssl_scanner;
pub mod ssrf;
pub mod ssti;
pub mod subdomain_takeover;
pub mod xss;
pub mod xxe;

use std::time::Duration;

use async_trait::async_trait;

use crate::finding::Finding;

/// Per-run tuning a probe may read; query-parameter names default sensibly
/// per module when left empty.
#[derive(Debug, Clone, Default)]
pub struct ProbeConfig {
    pub params: Vec<String>,
    pub request_timeout: Duration,
}

/// Capability set every dynamic probe module implements.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;
    fn module_id(&self) -> &'static str;

    /// Run the probe against `target_url`. Connection failures, timeouts,
    /// and malformed responses are swallowed — a probe that cannot reach
    /// its target simply returns no findings rather than erroring the
    /// whole orchestration run.
    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding>;
}

fn http_client(config: &ProbeConfig) -> reqwest::Client {
    let timeout = if config.request_timeout.is_zero() {
        Duration::from_secs(10)
    } else {
        config.request_timeout
    };
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Append a query parameter to `url`, choosing `&` or `?` as needed.
fn with_param(url: &str, param: &str, value: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{param}={value}")
}

/// The static probe registry — every entry here runs whenever a full
/// dynamic scan is requested.
pub fn registry() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(sqli::SqliProbe),
        Box::new(xss::XssProbe),
        Box::new(ssl_scanner::SslScannerProbe),
        Box::new(s3_public::S3PublicProbe),
        Box::new(bola::BolaProbe),
        Box::new(csrf::CsrfProbe),
        Box::new(graphql::GraphqlProbe),
        Box::new(idor::IdorProbe),
        Box::new(lfi::LfiProbe),
        Box::new(mass_assignment::MassAssignmentProbe),
        Box::new(nosqli::NosqliProbe),
        Box::new(open_redirect::OpenRedirectProbe),
        Box::new(rce::RceProbe),
        Box::new(sensitive_data_exposure::SensitiveDataExposureProbe),
        Box::new(ssrf::SsrfProbe),
        Box::new(ssti::SstiProbe),
        Box::new(subdomain_takeover::SubdomainTakeoverProbe),
        Box::new(xxe::XxeProbe),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_one_entry_per_module() {
        let probes = registry();
        assert_eq!(probes.len(), 18);
    }

    #[test]
    fn test_with_param_picks_separator() {
        assert_eq!(with_param("http://a", "x", "1"), "http://a?x=1");
        assert_eq!(with_param("http://a?y=2", "x", "1"), "http://a?y=2&x=1");
    }
}
