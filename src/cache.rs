//! Bounded scan-result cache (§4 "Cache Entry", §5 "Shared resources").
//!
//! Keyed by `sha256(mode || input)`. The Coordinator owns one instance
//! exclusively; each operation holds the guard only long enough to move or
//! insert an entry.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::result::ScanResult;

fn cache_key(mode: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mode.as_bytes());
    hasher.update(b"\0");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct ScanCache {
    inner: Mutex<LruCache<String, ScanResult>>,
    hits: Mutex<u64>,
    misses: Mutex<u64>,
}

impl ScanCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: Mutex::new(0),
            misses: Mutex::new(0),
        }
    }

    pub fn get(&self, mode: &str, input: &str) -> Option<ScanResult> {
        let key = cache_key(mode, input);
        let mut inner = self.inner.lock().expect("scan cache mutex poisoned");
        let hit = inner.get(&key).cloned();
        if hit.is_some() {
            *self.hits.lock().expect("scan cache mutex poisoned") += 1;
        } else {
            *self.misses.lock().expect("scan cache mutex poisoned") += 1;
        }
        hit
    }

    pub fn insert(&self, mode: &str, input: &str, result: ScanResult) {
        let key = cache_key(mode, input);
        let mut inner = self.inner.lock().expect("scan cache mutex poisoned");
        inner.put(key, result);
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("scan cache mutex poisoned");
        CacheStats {
            hits: *self.hits.lock().expect("scan cache mutex poisoned"),
            misses: *self.misses.lock().expect("scan cache mutex poisoned"),
            len: inner.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RiskLevel;

    fn sample_result(id: &str) -> ScanResult {
        ScanResult {
            scan_id: id.to_string(),
            input_hash: "h".to_string(),
            findings: Vec::new(),
            overall_risk_score: 0.0,
            risk_level: RiskLevel::Low,
            compliance: Vec::new(),
            remediation_summary: Vec::new(),
            audit_record_hash: "hash".to_string(),
        }
    }

    #[test]
    fn test_miss_then_hit_on_same_input() {
        let cache = ScanCache::new(8);
        assert!(cache.get("full", "x").is_none());
        cache.insert("full", "x", sample_result("s1"));
        let hit = cache.get("full", "x").unwrap();
        assert_eq!(hit.scan_id, "s1");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_different_mode_is_a_different_key() {
        let cache = ScanCache::new(8);
        cache.insert("full", "x", sample_result("s1"));
        assert!(cache.get("fast", "x").is_none());
    }

    #[test]
    fn test_eviction_past_capacity() {
        let cache = ScanCache::new(1);
        cache.insert("full", "a", sample_result("s1"));
        cache.insert("full", "b", sample_result("s2"));
        assert!(cache.get("full", "a").is_none());
        assert!(cache.get("full", "b").is_some());
    }

    #[test]
    fn test_repeated_scan_hits_cache_byte_for_byte() {
        let cache = ScanCache::new(8);
        let result = sample_result("s1");
        cache.insert("full", "x", result.clone());
        let first = cache.get("full", "x").unwrap();
        let second = cache.get("full", "x").unwrap();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}
