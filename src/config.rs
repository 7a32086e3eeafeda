//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration, passed to [`crate::coordinator::Engine::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of `ScanResult`s held in the LRU cache.
    pub cache_capacity: usize,
    /// Whether the CVE/OSV feed clients are allowed to make network calls.
    pub enable_live_feeds: bool,
    /// Inputs larger than this are rejected before any scan work begins.
    pub max_input_bytes: usize,
    /// Global wall-clock deadline for the probe orchestrator, in seconds.
    pub global_probe_deadline_sec: u64,
    /// Per-HTTP-request timeout enforced by every probe module, in seconds.
    pub per_request_timeout_sec: u64,
    pub secrets: SecretsConfig,
    pub pii: PiiConfig,
    pub prompt: PromptConfig,
    pub compliance: ComplianceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            enable_live_feeds: true,
            max_input_bytes: 52_428_800,
            global_probe_deadline_sec: 300,
            per_request_timeout_sec: 10,
            secrets: SecretsConfig::default(),
            pii: PiiConfig::default(),
            prompt: PromptConfig::default(),
            compliance: ComplianceConfig::default(),
        }
    }
}

/// Secret-detector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Shannon-entropy threshold (bits/char) below which entropy-gated rules discard a match.
    pub entropy_threshold: f64,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self { entropy_threshold: 3.5 }
    }
}

/// PII-analyzer backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiBackend {
    /// Regex-only detection (always available).
    Regex,
    /// NLP entity-recognition backend, dispatched through an external collaborator.
    /// Falls back to `Regex` transparently if no backend is wired up.
    Nlp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiConfig {
    pub backend: PiiBackend,
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self { backend: PiiBackend::Regex }
    }
}

/// Prompt-injection analyzer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Maximum recursion depth for base64-obfuscation decoding.
    pub max_decode_depth: u8,
    /// Risk score above which `generate_safer_prompt` produces a rewritten prompt.
    pub safer_prompt_threshold: f64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_decode_depth: 2,
            safer_prompt_threshold: 20.0,
        }
    }
}

/// Which compliance frameworks to compute verdicts for (empty = all).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    pub frameworks: Vec<String>,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self { frameworks: Vec::new() }
    }
}
