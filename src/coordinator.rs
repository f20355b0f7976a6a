// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Scan Coordinator
 * Runs the four detection modules sequentially for one target, merges their
 * output into a single risk-scored report and publishes progress events
 */

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::{ModuleConfig, ScannerConfig};
use crate::scanners::{CsrfScanner, IdorScanner, ModuleKind, ModuleReport, SqliScanner, XssScanner};
use crate::types::{
    Category, Finding, ModuleState, OverallRisk, Risk, ScanEvent, ScanReport, ScanStatistics,
    ScanSummary, ScannerStatus, ScannerStatuses,
};

const TOTAL_SCANNERS: usize = 4;
/// Fixed pause between modules.
const INTER_MODULE_PAUSE_SECS: u64 = 1;

/// Build a scan identifier in the `scan_<epoch>_<4 digits>` shape.
pub fn generate_scan_id(target: &str) -> String {
    let mut hasher = DefaultHasher::new();
    target.hash(&mut hasher);
    format!(
        "scan_{}_{:04}",
        chrono::Utc::now().timestamp(),
        hasher.finish() % 10_000
    )
}

/// Drives one scan end to end. Owns nothing shared: each coordinator call
/// works on its own session, so scans for different targets can run on
/// concurrent tasks without coordination.
pub struct ScanCoordinator {
    config: ScannerConfig,
    events: Option<mpsc::UnboundedSender<ScanEvent>>,
}

impl ScanCoordinator {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            events: None,
        }
    }

    /// Attach the progress channel. Sends are fire-and-forget: a dropped
    /// receiver never affects a scan.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run all four detection modules against the target, strictly in the
    /// fixed order, and produce the completed report. Module failures
    /// degrade the report; they never abort the scan.
    pub async fn run(&self, scan_id: String, target: String) -> ScanReport {
        info!(%scan_id, %target, "Starting comprehensive security scan");
        let mut session = ScanSession::new(scan_id, target);
        self.emit_progress(&session, "Initializing scanners...");

        let target = session.report.target.clone();
        for kind in ModuleKind::ALL {
            session.set_state(kind, ModuleState::Running);
            self.emit_progress(&session, &format!("Running {} scan...", kind.display_name()));

            match self.run_module(kind, &target).await {
                Ok(module_report) => session.merge(kind, module_report),
                Err(err) => {
                    error!(module = kind.key(), %err, "scanner failed");
                    session.record_failure(kind, &err.to_string());
                }
            }

            session.completed_modules += 1;
            self.emit_progress(&session, &format!("{} completed", kind.display_name()));

            tokio::time::sleep(Duration::from_secs(INTER_MODULE_PAUSE_SECS)).await;
        }

        let report = session.finish();
        info!(
            scan_id = %report.scan_id,
            duration = report.scan_duration,
            vulnerabilities = report.statistics.vulnerabilities_found,
            "Scan completed"
        );
        report
    }

    async fn run_module(&self, kind: ModuleKind, target: &str) -> anyhow::Result<ModuleReport> {
        let timeout = self.config.request_timeout_secs;
        let delay_range = self.config.delay_range;
        // The policy auditor sends few requests and runs undelayed.
        let random_delay = kind != ModuleKind::Csrf;
        let module_config = ModuleConfig::new(timeout, random_delay, delay_range);

        match kind {
            ModuleKind::Xss => XssScanner::new(target, &module_config)?.scan().await,
            ModuleKind::Sqli => SqliScanner::new(target, &module_config)?.scan().await,
            ModuleKind::Idor => IdorScanner::new(target, &module_config)?.scan().await,
            ModuleKind::Csrf => CsrfScanner::new(target, &module_config)?.scan().await,
        }
    }

    fn emit_progress(&self, session: &ScanSession, message: &str) {
        let Some(events) = &self.events else {
            return;
        };
        let _ = events.send(ScanEvent::ScanProgress {
            scan_id: session.report.scan_id.clone(),
            target: session.report.target.clone(),
            progress: session.completed_modules as f64 / TOTAL_SCANNERS as f64 * 100.0,
            completed_scanners: session.completed_modules,
            total_scanners: TOTAL_SCANNERS,
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }
}

/// The single mutable aggregate of one scan, owned exclusively by the task
/// executing it. Published to the registry only after `finish`.
struct ScanSession {
    report: ScanReport,
    started: Instant,
    completed_modules: usize,
}

impl ScanSession {
    fn new(scan_id: String, target: String) -> Self {
        Self {
            report: ScanReport {
                scan_id,
                target,
                timestamp: chrono::Utc::now().to_rfc3339(),
                scan_duration: 0.0,
                vulnerabilities: Vec::new(),
                statistics: ScanStatistics {
                    scanners_used: TOTAL_SCANNERS as u32,
                    ..ScanStatistics::default()
                },
                scanners: ScannerStatuses::default(),
                summary: None,
            },
            started: Instant::now(),
            completed_modules: 0,
        }
    }

    fn status_mut(&mut self, kind: ModuleKind) -> &mut ScannerStatus {
        match kind {
            ModuleKind::Xss => &mut self.report.scanners.xss,
            ModuleKind::Sqli => &mut self.report.scanners.sqli,
            ModuleKind::Idor => &mut self.report.scanners.idor,
            ModuleKind::Csrf => &mut self.report.scanners.csrf,
        }
    }

    fn set_state(&mut self, kind: ModuleKind, state: ModuleState) {
        self.status_mut(kind).status = state;
    }

    /// Fold one module's output into the session. Vulnerability and warning
    /// findings are merged into the report, tagged with the module name;
    /// info notes stay module-local.
    fn merge(&mut self, kind: ModuleKind, module_report: ModuleReport) {
        let vulnerabilities = module_report.vulnerability_count();
        let warnings = module_report.warning_count();

        for mut finding in module_report.findings {
            if finding.category == Category::Info {
                continue;
            }
            finding.scanner = kind.display_name().to_string();
            self.report.vulnerabilities.push(finding);
        }

        self.report.statistics.requests_made += module_report.requests_made;
        self.report.statistics.total_checks += module_report.checks;
        self.report.statistics.vulnerabilities_found += vulnerabilities as u64;

        let status = self.status_mut(kind);
        status.status = ModuleState::Completed;
        status.vulnerabilities = vulnerabilities;
        status.warnings = warnings;
    }

    /// A module failure becomes one warning-level finding and a failed
    /// status; the scan continues.
    fn record_failure(&mut self, kind: ModuleKind, error: &str) {
        let mut finding = Finding::warning(format!("Scan error: {}", error), "");
        finding.scanner = kind.display_name().to_string();
        self.report.vulnerabilities.push(finding);

        let status = self.status_mut(kind);
        status.status = ModuleState::Failed;
        status.error = Some(error.to_string());
        status.warnings = 1;
    }

    fn finish(mut self) -> ScanReport {
        self.report.scan_duration = self.started.elapsed().as_secs_f64();
        self.report.summary = Some(compute_summary(
            &self.report.vulnerabilities,
            self.report.statistics.vulnerabilities_found,
            self.completed_modules,
            self.report.scan_duration,
        ));
        self.report
    }
}

enum Bucket {
    Critical,
    High,
    Medium,
    Low,
}

/// Joint risk/confidence bucketing. A finding that misses its own bucket's
/// confidence threshold falls all the way to low.
fn bucket(risk: Risk, confidence: f64) -> Bucket {
    match risk {
        Risk::Critical if confidence > 0.8 => Bucket::Critical,
        Risk::High if confidence > 0.7 => Bucket::High,
        Risk::Medium if confidence > 0.5 => Bucket::Medium,
        _ => Bucket::Low,
    }
}

/// Pure and deterministic: identical findings always produce identical
/// bucket counts and verdict.
pub fn compute_summary(
    findings: &[Finding],
    vulnerabilities_found: u64,
    scanners_completed: usize,
    scan_duration: f64,
) -> ScanSummary {
    let mut critical = 0usize;
    let mut high = 0usize;
    let mut medium = 0usize;
    let mut low = 0usize;

    for finding in findings {
        match bucket(finding.risk, finding.confidence) {
            Bucket::Critical => critical += 1,
            Bucket::High => high += 1,
            Bucket::Medium => medium += 1,
            Bucket::Low => low += 1,
        }
    }

    let score = critical * 4 + high * 3 + medium * 2 + low;

    let overall_risk_level = if critical > 0 {
        OverallRisk::Critical
    } else if score > 5 {
        OverallRisk::High
    } else if score > 2 {
        OverallRisk::Medium
    } else {
        OverallRisk::Low
    };

    ScanSummary {
        total_vulnerabilities: vulnerabilities_found,
        critical_vulnerabilities: critical,
        high_vulnerabilities: high,
        medium_vulnerabilities: medium,
        low_vulnerabilities: low,
        overall_risk_level,
        scanners_completed,
        total_scanners: TOTAL_SCANNERS,
        scan_efficiency: format!("{:.2} seconds", scan_duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(risk: Risk, confidence: f64) -> Finding {
        Finding::vulnerability("Test", "issue", risk, confidence, "", "")
    }

    #[test]
    fn high_bucket_boundary_is_exclusive() {
        let above = compute_summary(&[finding(Risk::High, 0.71)], 1, 4, 1.0);
        assert_eq!(above.high_vulnerabilities, 1);
        assert_eq!(above.low_vulnerabilities, 0);

        let at = compute_summary(&[finding(Risk::High, 0.70)], 1, 4, 1.0);
        assert_eq!(at.high_vulnerabilities, 0);
        assert_eq!(at.low_vulnerabilities, 1);
    }

    #[test]
    fn critical_bucket_requires_confidence_above_080() {
        let kept = compute_summary(&[finding(Risk::Critical, 0.81)], 1, 4, 1.0);
        assert_eq!(kept.critical_vulnerabilities, 1);
        assert_eq!(kept.overall_risk_level, OverallRisk::Critical);

        let dropped = compute_summary(&[finding(Risk::Critical, 0.8)], 1, 4, 1.0);
        assert_eq!(dropped.critical_vulnerabilities, 0);
        assert_eq!(dropped.low_vulnerabilities, 1);
        assert_eq!(dropped.overall_risk_level, OverallRisk::Low);
    }

    #[test]
    fn verdict_thresholds_follow_weighted_score() {
        // Two highs: score 6 > 5 -> HIGH.
        let high = compute_summary(
            &[finding(Risk::High, 0.9), finding(Risk::High, 0.9)],
            2,
            4,
            1.0,
        );
        assert_eq!(high.overall_risk_level, OverallRisk::High);

        // One high + nothing else: score 3 -> MEDIUM.
        let medium = compute_summary(&[finding(Risk::High, 0.9)], 1, 4, 1.0);
        assert_eq!(medium.overall_risk_level, OverallRisk::Medium);

        // One medium: score 2 -> LOW.
        let low = compute_summary(&[finding(Risk::Medium, 0.6)], 1, 4, 1.0);
        assert_eq!(low.overall_risk_level, OverallRisk::Low);
    }

    #[test]
    fn warnings_land_in_the_low_bucket() {
        let warning = Finding::warning("careful", "");
        let summary = compute_summary(&[warning], 0, 4, 1.0);
        assert_eq!(summary.low_vulnerabilities, 1);
        assert_eq!(summary.total_vulnerabilities, 0);
    }

    #[test]
    fn summary_is_deterministic() {
        let findings = vec![
            finding(Risk::High, 0.9),
            finding(Risk::Medium, 0.6),
            Finding::warning("w", ""),
        ];
        let first = compute_summary(&findings, 2, 4, 1.0);
        let second = compute_summary(&findings, 2, 4, 1.0);
        assert_eq!(first.overall_risk_level, second.overall_risk_level);
        assert_eq!(first.high_vulnerabilities, second.high_vulnerabilities);
        assert_eq!(first.medium_vulnerabilities, second.medium_vulnerabilities);
        assert_eq!(first.low_vulnerabilities, second.low_vulnerabilities);
    }

    #[test]
    fn merge_tags_findings_and_drops_info() {
        let mut session = ScanSession::new("scan_1".to_string(), "http://t.example".to_string());
        let mut module_report = ModuleReport::default();
        module_report.add_info("Found 2 forms");
        module_report.add_vulnerability(finding(Risk::High, 0.9));
        module_report.add_warning("careful", "");
        module_report.requests_made = 7;

        session.merge(ModuleKind::Xss, module_report);

        assert_eq!(session.report.vulnerabilities.len(), 2);
        assert!(session
            .report
            .vulnerabilities
            .iter()
            .all(|f| f.scanner == "XSS"));
        assert_eq!(session.report.statistics.requests_made, 7);
        assert_eq!(session.report.statistics.total_checks, 1);
        assert_eq!(session.report.statistics.vulnerabilities_found, 1);
        assert_eq!(session.report.scanners.xss.status, ModuleState::Completed);
        assert_eq!(session.report.scanners.xss.vulnerabilities, 1);
        assert_eq!(session.report.scanners.xss.warnings, 1);
    }

    #[test]
    fn failed_module_degrades_but_keeps_other_results() {
        let mut session = ScanSession::new("scan_1".to_string(), "http://t.example".to_string());

        let mut xss_report = ModuleReport::default();
        xss_report.add_vulnerability(finding(Risk::High, 0.9));
        session.merge(ModuleKind::Xss, xss_report);

        session.record_failure(ModuleKind::Sqli, "connection pool exhausted");

        let mut idor_report = ModuleReport::default();
        idor_report.add_vulnerability(finding(Risk::Medium, 0.6));
        session.merge(ModuleKind::Idor, idor_report);

        session.completed_modules = 4;
        let report = session.finish();

        assert_eq!(report.scanners.sqli.status, ModuleState::Failed);
        assert_eq!(
            report.scanners.sqli.error.as_deref(),
            Some("connection pool exhausted")
        );
        assert_eq!(report.scanners.xss.status, ModuleState::Completed);
        assert_eq!(report.scanners.idor.status, ModuleState::Completed);

        // Both surviving findings plus the failure warning are present.
        assert_eq!(report.vulnerabilities.len(), 3);
        let failure = report
            .vulnerabilities
            .iter()
            .find(|f| f.scanner == "SQL Injection")
            .unwrap();
        assert_eq!(failure.category, Category::Warning);
        assert!(failure.issue.contains("connection pool exhausted"));
        assert!(report.summary.is_some());
    }

    #[test]
    fn scan_id_has_expected_shape() {
        let scan_id = generate_scan_id("http://t.example");
        assert!(scan_id.starts_with("scan_"));
        let suffix = scan_id.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }
}
