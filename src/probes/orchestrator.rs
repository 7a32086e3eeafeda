//! Probe Orchestrator: runs every registered probe concurrently against a
//! target, bounded by a global wall-clock deadline.
//!
//! No filesystem or reflection-based module discovery — the orchestrator
//! iterates the static [`super::registry`] table.

use std::time::Duration;

use crate::finding::Finding;

use super::{registry, ProbeConfig};

pub struct ProbeOrchestrator {
    config: ProbeConfig,
    global_deadline: Duration,
}

impl ProbeOrchestrator {
    pub fn new(config: ProbeConfig, global_deadline: Duration) -> Self {
        Self { config, global_deadline }
    }

    pub fn module_names() -> Vec<&'static str> {
        registry().iter().map(|p| p.name()).collect()
    }

    /// Run every registered probe against `target_url`, awaiting all to
    /// completion with no early termination on first finding. Each probe is
    /// bounded by the same global deadline individually, so a probe that
    /// does not finish in time contributes no findings while every probe
    /// that does complete in time is still collected, rather than a single
    /// slow probe discarding the whole batch's results.
    pub async fn run_full_scan(&self, target_url: &str) -> Vec<Finding> {
        let target = target_url.to_string();
        let config = self.config.clone();
        let deadline = self.global_deadline;

        let probes = registry();
        let tasks = probes.into_iter().map(|probe| {
            let target = target.clone();
            let config = config.clone();
            let handle = tokio::spawn(async move { probe.run(&target, &config).await });
            async move { tokio::time::timeout(deadline, handle).await }
        });

        futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter_map(|r| r.ok().and_then(|joined| joined.ok()))
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names_cover_every_registered_probe() {
        let names = ProbeOrchestrator::module_names();
        assert_eq!(names.len(), registry().len());
        assert!(names.contains(&"SQL Injection"));
        assert!(names.contains(&"XML External Entity (XXE)"));
    }

    #[tokio::test]
    async fn test_unreachable_target_completes_within_deadline() {
        let orchestrator =
            ProbeOrchestrator::new(ProbeConfig::default(), Duration::from_secs(2));
        let findings = orchestrator.run_full_scan("http://127.0.0.1:1").await;
        assert!(findings.is_empty());
    }
}
