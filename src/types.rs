// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

/// Severity bucket a finding is tagged with by the module that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Risk::Critical => write!(f, "critical"),
            Risk::High => write!(f, "high"),
            Risk::Medium => write!(f, "medium"),
            Risk::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vulnerability,
    Warning,
    Info,
}

/// A single observation produced by a detection module.
///
/// `risk` and `confidence` are assigned independently by the producing
/// module; they are only combined during summary bucketing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: String,
    pub risk: Risk,
    pub confidence: f64,
    pub issue: String,
    pub evidence: String,
    pub location: String,
    /// Filled in by the coordinator when the module's results are merged.
    #[serde(default)]
    pub scanner: String,
    pub timestamp: String,
}

impl Finding {
    pub fn vulnerability(
        kind: &str,
        issue: impl Into<String>,
        risk: Risk,
        confidence: f64,
        evidence: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            category: Category::Vulnerability,
            kind: kind.to_string(),
            risk,
            confidence,
            issue: issue.into(),
            evidence: evidence.into(),
            location: location.into(),
            scanner: String::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn warning(issue: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            category: Category::Warning,
            kind: "Warning".to_string(),
            risk: Risk::Low,
            confidence: 0.0,
            issue: issue.into(),
            evidence: evidence.into(),
            location: String::new(),
            scanner: String::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn info(issue: impl Into<String>) -> Self {
        Self {
            category: Category::Info,
            kind: "Info".to_string(),
            risk: Risk::Low,
            confidence: 0.0,
            issue: issue.into(),
            evidence: String::new(),
            location: String::new(),
            scanner: String::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Lifecycle of one detection module within one scan. Transitions are driven
/// solely by the coordinator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerStatus {
    pub status: ModuleState,
    pub vulnerabilities: usize,
    pub warnings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ScannerStatus {
    fn default() -> Self {
        Self {
            status: ModuleState::Pending,
            vulnerabilities: 0,
            warnings: 0,
            error: None,
        }
    }
}

/// Per-module status block, fixed to the four detection modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerStatuses {
    pub xss: ScannerStatus,
    pub sqli: ScannerStatus,
    pub idor: ScannerStatus,
    pub csrf: ScannerStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub total_checks: u64,
    pub vulnerabilities_found: u64,
    pub scanners_used: u32,
    pub requests_made: u64,
}

/// Overall verdict for a completed scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallRisk {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallRisk::Critical => write!(f, "CRITICAL"),
            OverallRisk::High => write!(f, "HIGH"),
            OverallRisk::Medium => write!(f, "MEDIUM"),
            OverallRisk::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_vulnerabilities: u64,
    pub critical_vulnerabilities: usize,
    pub high_vulnerabilities: usize,
    pub medium_vulnerabilities: usize,
    pub low_vulnerabilities: usize,
    pub overall_risk_level: OverallRisk,
    pub scanners_completed: usize,
    pub total_scanners: usize,
    pub scan_efficiency: String,
}

/// The full report for one scan, serialized as-is by the results endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: String,
    pub target: String,
    pub timestamp: String,
    pub scan_duration: f64,
    /// All findings, vulnerability and warning categories merged, each
    /// carrying its category tag.
    pub vulnerabilities: Vec<Finding>,
    pub statistics: ScanStatistics,
    pub scanners: ScannerStatuses,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScanSummary>,
}

/// Events published by the coordinator over the progress channel.
/// Delivery is fire-and-forget; a missing subscriber never affects a scan.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    ScanProgress {
        scan_id: String,
        target: String,
        progress: f64,
        completed_scanners: usize,
        total_scanners: usize,
        message: String,
        timestamp: String,
    },
    ScanComplete {
        scan_id: String,
        target: String,
        summary: ScanSummary,
        timestamp: String,
    },
    ScanError {
        scan_id: String,
        target: String,
        error: String,
    },
}
