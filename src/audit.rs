//! Append-only, hash-chained audit log (§5 "Audit Record", §8 invariant 5).
//!
//! Each record seals over its own content plus the previous record's hash,
//! so altering any past record changes every subsequent hash.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ScanError;

/// Sealing hash of an empty chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub scan_id: String,
    pub input_fingerprint: String,
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub engine_version: String,
    pub finding_count: usize,
    pub overall_score: f64,
    pub prev_hash: String,
    pub hash: String,
}

/// What the caller supplies; `prev_hash` and `hash` are computed by
/// [`AuditLog::seal_and_append`].
#[derive(Debug, Clone, Serialize)]
pub struct PendingRecord {
    pub scan_id: String,
    pub input_fingerprint: String,
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub engine_version: String,
    pub finding_count: usize,
    pub overall_score: f64,
}

fn seal(pending: &PendingRecord, prev_hash: &str) -> Result<String, ScanError> {
    let canonical = serde_json::to_vec(pending)
        .map_err(|e| ScanError::AuditSealFailed(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hasher.update(prev_hash.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Hash-chained, append-only log. Append is serialized behind a mutex so
/// seal-and-append is atomic with respect to the chain head.
pub struct AuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self { records: Mutex::new(Vec::new()) }
    }

    /// Compute this record's sealing hash over its content and the current
    /// chain head, then append it, advancing the head. Returns the new hash.
    pub fn seal_and_append(&self, pending: PendingRecord) -> Result<String, ScanError> {
        let mut records = self.records.lock().expect("audit log mutex poisoned");
        let prev_hash = records.last().map(|r| r.hash.clone()).unwrap_or_else(|| GENESIS_HASH.to_string());
        let hash = seal(&pending, &prev_hash)?;
        let record = AuditRecord {
            scan_id: pending.scan_id,
            input_fingerprint: pending.input_fingerprint,
            timestamp: pending.timestamp,
            mode: pending.mode,
            engine_version: pending.engine_version,
            finding_count: pending.finding_count,
            overall_score: pending.overall_score,
            prev_hash,
            hash: hash.clone(),
        };
        records.push(record);
        Ok(hash)
    }

    /// Recompute every record's hash from its content and the preceding
    /// record's stored hash; the chain is valid iff every recomputed hash
    /// matches what's stored and the links are contiguous.
    pub fn verify_chain(&self) -> bool {
        let records = self.records.lock().expect("audit log mutex poisoned");
        let mut prev_hash = GENESIS_HASH.to_string();
        for record in records.iter() {
            if record.prev_hash != prev_hash {
                return false;
            }
            let pending = PendingRecord {
                scan_id: record.scan_id.clone(),
                input_fingerprint: record.input_fingerprint.clone(),
                timestamp: record.timestamp,
                mode: record.mode.clone(),
                engine_version: record.engine_version.clone(),
                finding_count: record.finding_count,
                overall_score: record.overall_score,
            };
            let recomputed = match seal(&pending, &prev_hash) {
                Ok(h) => h,
                Err(_) => return false,
            };
            if recomputed != record.hash {
                return false;
            }
            prev_hash = record.hash.clone();
        }
        true
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("audit log mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("audit log mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(scan_id: &str) -> PendingRecord {
        PendingRecord {
            scan_id: scan_id.to_string(),
            input_fingerprint: "fp".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc),
            mode: "full".to_string(),
            engine_version: "1.0.0".to_string(),
            finding_count: 0,
            overall_score: 0.0,
        }
    }

    #[test]
    fn test_first_record_chains_from_genesis() {
        let log = AuditLog::new();
        log.seal_and_append(pending("s1")).unwrap();
        let records = log.records();
        assert_eq!(records[0].prev_hash, GENESIS_HASH);
    }

    #[test]
    fn test_chain_links_consecutive_records() {
        let log = AuditLog::new();
        log.seal_and_append(pending("s1")).unwrap();
        log.seal_and_append(pending("s2")).unwrap();
        let records = log.records();
        assert_eq!(records[1].prev_hash, records[0].hash);
    }

    #[test]
    fn test_unaltered_chain_verifies_clean() {
        let log = AuditLog::new();
        log.seal_and_append(pending("s1")).unwrap();
        log.seal_and_append(pending("s2")).unwrap();
        log.seal_and_append(pending("s3")).unwrap();
        assert!(log.verify_chain());
    }

    #[test]
    fn test_tampering_a_past_record_breaks_verification() {
        let log = AuditLog::new();
        log.seal_and_append(pending("s1")).unwrap();
        log.seal_and_append(pending("s2")).unwrap();
        {
            let mut records = log.records.lock().unwrap();
            records[0].finding_count = 99;
        }
        assert!(!log.verify_chain());
    }

    #[test]
    fn test_empty_log_verifies_clean() {
        let log = AuditLog::new();
        assert!(log.verify_chain());
        assert!(log.is_empty());
    }
}
