//! A unified, multi-domain security scanning engine: static code analysis,
//! secret detection, PII exposure, prompt-injection defense, dynamic attack
//! surface probing, dependency-vulnerability lookups, and a compliance
//! matrix over the combined finding set.
//!
//! The [`coordinator::Engine`] is the single entry point; construct one with
//! [`config::EngineConfig`] and call [`coordinator::Engine::scan`] or
//! [`stream::stream_scan`].

pub mod analyzers;
pub mod audit;
pub mod cache;
pub mod compliance;
pub mod config;
pub mod coordinator;
pub mod entropy;
pub mod error;
pub mod feeds;
pub mod finding;
pub mod probes;
pub mod registry;
pub mod report;
pub mod result;
pub mod stream;

pub use config::EngineConfig;
pub use coordinator::{Engine, ScanMode, SharedEngine};
pub use error::EngineError;
pub use finding::{Domain, Finding, Severity};
pub use result::{RiskLevel, ScanResult};
