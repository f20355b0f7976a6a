// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Result and Session Registry
 * Thread-safe store of completed reports and in-flight scan metadata
 */

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

use crate::types::ScanReport;

/// Metadata for a scan that has been accepted but not yet completed.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveScan {
    pub target: String,
    pub started_at: String,
    pub status: String,
    pub scanners: Vec<String>,
}

/// What the registry stores for a finished scan: a full report, or the
/// error that aborted it.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StoredResult {
    Report(Box<ScanReport>),
    Failure {
        error: String,
        status: String,
        timestamp: String,
    },
}

/// Keyed by scan id. An explicit handle passed to the front end and scan
/// tasks; the registry owns its own synchronization.
#[derive(Default)]
pub struct ScanRegistry {
    results: RwLock<HashMap<String, StoredResult>>,
    active: RwLock<HashMap<String, ActiveScan>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_active(&self, scan_id: &str, target: &str) {
        self.active.write().insert(
            scan_id.to_string(),
            ActiveScan {
                target: target.to_string(),
                started_at: chrono::Utc::now().to_rfc3339(),
                status: "running".to_string(),
                scanners: vec![
                    "XSS".to_string(),
                    "SQLi".to_string(),
                    "IDOR".to_string(),
                    "CSRF".to_string(),
                ],
            },
        );
    }

    pub fn store_report(&self, report: ScanReport) {
        let scan_id = report.scan_id.clone();
        self.results
            .write()
            .insert(scan_id.clone(), StoredResult::Report(Box::new(report)));
        self.active.write().remove(&scan_id);
    }

    pub fn store_failure(&self, scan_id: &str, error: &str) {
        self.results.write().insert(
            scan_id.to_string(),
            StoredResult::Failure {
                error: error.to_string(),
                status: "failed".to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.active.write().remove(scan_id);
    }

    pub fn get(&self, scan_id: &str) -> Option<StoredResult> {
        self.results.read().get(scan_id).cloned()
    }

    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }

    pub fn completed_count(&self) -> usize {
        self.results.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScanStatistics, ScannerStatuses};

    fn report(scan_id: &str) -> ScanReport {
        ScanReport {
            scan_id: scan_id.to_string(),
            target: "http://t.example".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            scan_duration: 1.0,
            vulnerabilities: Vec::new(),
            statistics: ScanStatistics::default(),
            scanners: ScannerStatuses::default(),
            summary: None,
        }
    }

    #[test]
    fn stored_report_is_retrievable_and_clears_active() {
        let registry = ScanRegistry::new();
        registry.register_active("scan_1", "http://t.example");
        assert_eq!(registry.active_count(), 1);

        registry.store_report(report("scan_1"));
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.completed_count(), 1);
        assert!(matches!(
            registry.get("scan_1"),
            Some(StoredResult::Report(_))
        ));
    }

    #[test]
    fn missing_scan_returns_none() {
        let registry = ScanRegistry::new();
        assert!(registry.get("scan_unknown").is_none());
    }

    #[test]
    fn failure_is_stored_with_error() {
        let registry = ScanRegistry::new();
        registry.register_active("scan_2", "http://t.example");
        registry.store_failure("scan_2", "boom");

        match registry.get("scan_2") {
            Some(StoredResult::Failure { error, status, .. }) => {
                assert_eq!(error, "boom");
                assert_eq!(status, "failed");
            }
            other => panic!("unexpected entry: {:?}", other),
        }
        assert_eq!(registry.active_count(), 0);
    }
}
