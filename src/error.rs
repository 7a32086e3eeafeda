//! Error types for the scanning engine.

use thiserror::Error;

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("compliance error: {0}")]
    Compliance(#[from] ComplianceError),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Errors from the static analyzers and the probe orchestrator.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("input too large: {size} bytes exceeds limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },
    #[error("unknown scan mode: {0}")]
    UnknownMode(String),
    #[error("rule '{rule_id}' failed to compile: {message}")]
    RuleCompileFailed { rule_id: String, message: String },
    #[error("audit seal failed: {0}")]
    AuditSealFailed(String),
    #[error("scan cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(String),
}

/// Errors from compliance-framework assessment.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("framework '{0}' is not supported")]
    UnsupportedFramework(String),
    #[error("{0}")]
    Other(String),
}

/// Errors from external-feed clients. These are never surfaced to callers —
/// feed clients catch every variant themselves and return an empty result —
/// but the type exists so internal plumbing has something to log.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network error: {0}")]
    Network(String),
    #[error("response parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Network(e.to_string())
    }
}
