// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Injection Tester (SQLi)
 * Error-signature and time-based SQL injection probing over forms and
 * query parameters
 */

use anyhow::Result;
use tracing::info;
use url::Url;

use crate::config::ModuleConfig;
use crate::payloads::{Payload, SQLI_PAYLOADS, SQL_ERROR_SIGNATURES};
use crate::probe::ProbeClient;
use crate::scanners::{
    form_probe_fields, query_param_names, resolve_action, url_with_param_replaced, url_with_query,
    ModuleReport,
};
use crate::surface::{self, DiscoveredForm};
use crate::types::{Finding, Risk};

const MAX_FORMS: usize = 3;
const MAX_URL_PARAMS: usize = 3;
const MAX_PAYLOADS: usize = 5;
/// Elapsed wall-clock above this marks a delay-inducing payload as effective.
const TIME_BASED_THRESHOLD_MS: u64 = 2_000;

pub struct SqliScanner {
    client: ProbeClient,
    target: String,
}

impl SqliScanner {
    pub fn new(target: impl Into<String>, config: &ModuleConfig) -> Result<Self> {
        Ok(Self {
            client: ProbeClient::new(config)?,
            target: target.into(),
        })
    }

    pub async fn scan(&self) -> Result<ModuleReport> {
        info!(target = %self.target, "Starting SQLi scan");
        let mut report = ModuleReport::default();

        let main_page = match self.client.fetch(&self.target).await {
            Ok(response) if response.is_success() => response,
            _ => {
                report.add_warning("Could not fetch main page", "");
                report.requests_made = self.client.requests_made();
                return Ok(report);
            }
        };

        let surface = surface::extract(&main_page.body, &self.target);
        report.add_info(format!("Found {} forms", surface.forms.len()));

        for form in surface.forms.iter().take(MAX_FORMS) {
            self.test_form(form, &mut report).await;
        }

        let parsed = Url::parse(&self.target)?;
        if parsed.query().is_some() {
            self.test_url_parameters(&parsed, &mut report).await;
        }

        report.requests_made = self.client.requests_made();
        Ok(report)
    }

    async fn test_form(&self, form: &DiscoveredForm, report: &mut ModuleReport) {
        let action_url = resolve_action(&self.target, &form.action);

        for payload in SQLI_PAYLOADS.iter().take(MAX_PAYLOADS) {
            let fields = form_probe_fields(form, payload.value);
            if fields.is_empty() {
                continue;
            }

            let response = if form.method == "post" {
                self.client.post_form(&action_url, &fields).await
            } else {
                self.client.fetch(&url_with_query(&action_url, &fields)).await
            };

            if let Ok(response) = response {
                if response.is_success() {
                    analyze_response(
                        &response.body,
                        response.duration_ms,
                        payload,
                        &form.action,
                        report,
                    );
                }
            }

            self.client.delay().await;
        }
    }

    async fn test_url_parameters(&self, parsed: &Url, report: &mut ModuleReport) {
        for param in query_param_names(parsed).iter().take(MAX_URL_PARAMS) {
            for payload in SQLI_PAYLOADS.iter().take(MAX_PAYLOADS) {
                let test_url = url_with_param_replaced(parsed, param, payload.value);

                if let Ok(response) = self.client.fetch(&test_url).await {
                    if response.is_success() {
                        analyze_response(
                            &response.body,
                            response.duration_ms,
                            payload,
                            &format!("param: {}", param),
                            report,
                        );
                    }
                }

                self.client.delay().await;
            }
        }
    }
}

/// Classify one probe response. Evaluation order is strict: backend error
/// signature first (first family match wins), then the time-based check,
/// then a boolean-tautology info note. Tautology payloads get no
/// differential-response comparison.
fn analyze_response(
    body: &str,
    duration_ms: u64,
    payload: &Payload,
    context: &str,
    report: &mut ModuleReport,
) {
    for (family, patterns) in SQL_ERROR_SIGNATURES.iter() {
        for pattern in patterns {
            if pattern.is_match(body) {
                report.add_vulnerability(Finding::vulnerability(
                    "SQL Injection",
                    format!("SQL Error detected (DB: {})", family),
                    Risk::High,
                    0.9,
                    format!("Pattern: {}...", truncate(pattern.as_str(), 50)),
                    context,
                ));
                return;
            }
        }
    }

    if payload.kind == "time_based" && duration_ms > TIME_BASED_THRESHOLD_MS {
        report.add_vulnerability(Finding::vulnerability(
            "SQL Injection (Time-based)",
            "Potential time-based SQL injection",
            Risk::High,
            0.7,
            format!("Response delay: {:.2}s", duration_ms as f64 / 1000.0),
            context,
        ));
    }

    if payload.value.contains("OR 1=1") {
        report.add_info(format!("Boolean test sent to {}", context));
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn payload(kind: &'static str, value: &'static str) -> Payload {
        Payload {
            value,
            kind,
            risk: Risk::Medium,
        }
    }

    #[test]
    fn mysql_error_signature_yields_high_confidence_finding() {
        let mut report = ModuleReport::default();
        analyze_response(
            "You have an error in your SQL syntax; check the manual",
            10,
            &payload("single_quote", "'"),
            "param: id",
            &mut report,
        );

        assert_eq!(report.vulnerability_count(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.kind, "SQL Injection");
        assert!(finding.issue.contains("mysql"));
        assert_eq!(finding.risk, Risk::High);
        assert!((finding.confidence - 0.9).abs() < f64::EPSILON);
        assert_eq!(finding.location, "param: id");
    }

    #[test]
    fn first_matching_family_wins() {
        let mut report = ModuleReport::default();
        // Body matches both the mysql and generic families; mysql is first.
        analyze_response(
            "Warning: mysql_query(): SQL syntax error near MySQL",
            10,
            &payload("comment", "' OR 1=1--"),
            "form",
            &mut report,
        );
        assert_eq!(report.vulnerability_count(), 1);
        assert!(report.findings[0].issue.contains("mysql"));
        // Error signature short-circuits the boolean info note.
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn slow_time_based_payload_detected() {
        let mut report = ModuleReport::default();
        analyze_response(
            "<html>ok</html>",
            2_400,
            &payload("time_based", "'; SELECT SLEEP(2)--"),
            "param: id",
            &mut report,
        );
        let finding = &report.findings[0];
        assert_eq!(finding.kind, "SQL Injection (Time-based)");
        assert!((finding.confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(finding.risk, Risk::High);
    }

    #[test]
    fn fast_time_based_payload_is_silent() {
        let mut report = ModuleReport::default();
        analyze_response(
            "<html>ok</html>",
            900,
            &payload("time_based", "'; SELECT SLEEP(2)--"),
            "param: id",
            &mut report,
        );
        assert!(report.findings.is_empty());
    }

    #[test]
    fn slow_response_without_delay_payload_is_silent() {
        let mut report = ModuleReport::default();
        analyze_response(
            "<html>ok</html>",
            5_000,
            &payload("single_quote", "'"),
            "param: id",
            &mut report,
        );
        assert!(report.findings.is_empty());
    }

    #[test]
    fn tautology_payload_only_notes_info() {
        let mut report = ModuleReport::default();
        analyze_response(
            "<html>ok</html>",
            10,
            &payload("comment", "' OR 1=1--"),
            "param: id",
            &mut report,
        );
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].category, Category::Info);
        assert!(report.findings[0].issue.contains("Boolean test sent to param: id"));
    }

    #[test]
    fn quoted_tautology_variant_does_not_note() {
        // "' OR '1'='1" does not contain the literal "OR 1=1".
        let mut report = ModuleReport::default();
        analyze_response(
            "<html>ok</html>",
            10,
            &payload("boolean_true", "' OR '1'='1"),
            "param: id",
            &mut report,
        );
        assert!(report.findings.is_empty());
    }
}
