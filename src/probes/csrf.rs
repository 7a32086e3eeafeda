//! CSRF probe: flags POST forms with no apparent anti-CSRF hidden field.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use crate::finding::{Domain, Finding, Location, Severity};

use super::{http_client, Probe, ProbeConfig};

const TOKEN_NAMES: &[&str] = &["csrf", "token", "xsrf", "authenticity_token"];

fn form_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<form\b[^>]*>.*?</form>").expect("static form regex must compile")
    })
}

fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)method\s*=\s*["']?(\w+)"#).expect("static method regex must compile")
    })
}

fn hidden_input_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<input\b[^>]*type\s*=\s*["']?hidden["']?[^>]*name\s*=\s*["']([^"']+)["']"#)
            .expect("static hidden-input regex must compile")
    })
}

pub struct CsrfProbe;

#[async_trait]
impl Probe for CsrfProbe {
    fn name(&self) -> &'static str {
        "Cross-Site Request Forgery (CSRF)"
    }

    fn module_id(&self) -> &'static str {
        "probes.csrf"
    }

    async fn run(&self, target_url: &str, config: &ProbeConfig) -> Vec<Finding> {
        let client = http_client(config);
        let Ok(resp) = client.get(target_url).send().await else { return Vec::new() };
        let Ok(body) = resp.text().await else { return Vec::new() };

        let mut findings = Vec::new();
        for (i, form_match) in form_re().find_iter(&body).enumerate() {
            let form = form_match.as_str();
            let method = method_re()
                .captures(form)
                .map(|c| c[1].to_uppercase())
                .unwrap_or_else(|| "GET".to_string());
            if method != "POST" {
                continue;
            }
            let has_token = hidden_input_name_re()
                .captures_iter(form)
                .any(|c| TOKEN_NAMES.iter().any(|tn| c[1].to_lowercase().contains(tn)));
            if !has_token {
                findings.push(
                    Finding::new(
                        Domain::ThreatIntel,
                        "missing_csrf_token",
                        Severity::Medium,
                        "Missing Anti-CSRF Token",
                        "A POST form was detected without an apparent anti-CSRF token. This may \
                         allow attackers to perform actions on behalf of authenticated users.",
                        Location::Url { url: target_url.to_string(), parameter: format!("form[{i}]") },
                        form.chars().take(100).collect::<String>(),
                        "Implement anti-CSRF tokens for all state-changing operations. Use the \
                         'SameSite' cookie attribute.",
                        0.75,
                    )
                    .with_cve_refs(vec!["CWE-352".to_string()]),
                );
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
    async fn test_post_form_without_token_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<form method="POST" action="/x"><input type="text" name="q"></form>"#,
            ))
            .mount(&server)
            .await;

        let probe = CsrfProbe;
        let findings = probe.run(&server.uri(), &ProbeConfig::default()).await;
        assert_eq!(findings.len(), 1);
    }

    #[tokio::test]
    async fn test_form_with_token_is_not_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<form method="POST" action="/x"><input type="hidden" name="csrf_token" value="abc"></form>"#,
            ))
            .mount(&server)
            .await;

        let probe = CsrfProbe;
        let findings = probe.run(&server.uri(), &ProbeConfig::default()).await;
        assert!(findings.is_empty());
    }
}
