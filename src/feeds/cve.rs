//! NVD (National Vulnerability Database) CVE lookup client.

use serde::Deserialize;
use std::time::Duration;

use crate::error::FeedError;

const BASE_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct Cve {
    pub id: String,
    pub description: String,
    pub base_score: Option<f32>,
    pub base_severity: Option<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Deserialize)]
struct NvdResponse {
    #[serde(default)]
    vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Deserialize)]
struct NvdVulnerability {
    cve: NvdCve,
}

#[derive(Deserialize)]
struct NvdCve {
    id: String,
    #[serde(default)]
    descriptions: Vec<NvdDescription>,
    #[serde(default)]
    metrics: NvdMetrics,
    #[serde(default)]
    weaknesses: Vec<NvdWeakness>,
}

#[derive(Deserialize)]
struct NvdDescription {
    lang: String,
    value: String,
}

#[derive(Deserialize, Default)]
struct NvdMetrics {
    #[serde(rename = "cvssMetricV31", default)]
    cvss_v31: Vec<NvdCvssMetric>,
    #[serde(rename = "cvssMetricV30", default)]
    cvss_v30: Vec<NvdCvssMetric>,
    #[serde(rename = "cvssMetricV2", default)]
    cvss_v2: Vec<NvdCvssMetric>,
}

#[derive(Deserialize)]
struct NvdCvssMetric {
    #[serde(rename = "cvssData")]
    cvss_data: NvdCvssData,
}

#[derive(Deserialize)]
struct NvdCvssData {
    #[serde(rename = "baseScore")]
    base_score: f32,
    #[serde(rename = "baseSeverity", default)]
    base_severity: Option<String>,
}

#[derive(Deserialize)]
struct NvdWeakness {
    #[serde(default)]
    description: Vec<NvdDescription>,
}

pub struct NvdClient {
    client: reqwest::Client,
}

impl NvdClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Look up up to `max_results` CVEs matching `keyword`. Any network,
    /// parse, or API error is logged and yields an empty list.
    pub async fn lookup(&self, keyword: &str, max_results: u32) -> Vec<Cve> {
        match self.lookup_inner(keyword, max_results).await {
            Ok(cves) => cves,
            Err(e) => {
                tracing::warn!(error = %e, keyword, "NVD lookup failed");
                Vec::new()
            }
        }
    }

    async fn lookup_inner(&self, keyword: &str, max_results: u32) -> Result<Vec<Cve>, FeedError> {
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("keywordSearch", keyword.to_string()),
                ("resultsPerPage", max_results.to_string()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(FeedError::from)?;
        let parsed: NvdResponse = resp.json().await.map_err(|e| FeedError::Parse(e.to_string()))?;

        Ok(parsed
            .vulnerabilities
            .into_iter()
            .map(|v| {
                let cve = v.cve;
                let description = cve
                    .descriptions
                    .iter()
                    .find(|d| d.lang == "en")
                    .map(|d| d.value.chars().take(300).collect())
                    .unwrap_or_default();
                let metric = cve
                    .metrics
                    .cvss_v31
                    .first()
                    .or_else(|| cve.metrics.cvss_v30.first())
                    .or_else(|| cve.metrics.cvss_v2.first());
                let weaknesses = cve
                    .weaknesses
                    .iter()
                    .flat_map(|w| w.description.iter())
                    .filter(|d| d.lang == "en")
                    .map(|d| d.value.clone())
                    .collect();
                Cve {
                    id: cve.id,
                    description,
                    base_score: metric.map(|m| m.cvss_data.base_score),
                    base_severity: metric.and_then(|m| m.cvss_data.base_severity.clone()),
                    weaknesses,
                }
            })
            .collect())
    }
}

impl Default for NvdClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_never_panics_on_bad_keyword() {
        // `lookup` swallows every network/parse error internally; a
        // malformed/empty keyword must still resolve, not panic.
        let client = NvdClient::new();
        let _ = client.lookup("", 0).await;
    }

    #[test]
    fn test_default_client_constructs() {
        let _client = NvdClient::default();
    }
}
