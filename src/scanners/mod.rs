// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Detection Modules
 * Common module contract and probe-building helpers
 */

use tracing::{debug, info, warn};
use url::Url;

use crate::surface::DiscoveredForm;
use crate::types::{Category, Finding};

pub mod csrf;
pub mod idor;
pub mod sqli;
pub mod xss;

pub use csrf::CsrfScanner;
pub use idor::IdorScanner;
pub use sqli::SqliScanner;
pub use xss::XssScanner;

/// The four detection modules, in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Xss,
    Sqli,
    Idor,
    Csrf,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Xss,
        ModuleKind::Sqli,
        ModuleKind::Idor,
        ModuleKind::Csrf,
    ];

    /// Status-map key.
    pub fn key(&self) -> &'static str {
        match self {
            ModuleKind::Xss => "xss",
            ModuleKind::Sqli => "sqli",
            ModuleKind::Idor => "idor",
            ModuleKind::Csrf => "csrf",
        }
    }

    /// Human-readable name used in reports and progress messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModuleKind::Xss => "XSS",
            ModuleKind::Sqli => "SQL Injection",
            ModuleKind::Idor => "IDOR",
            ModuleKind::Csrf => "CSRF",
        }
    }
}

/// Accumulated output of one module run. `checks` counts recorded
/// vulnerability findings; the coordinator sums it into `total_checks`.
#[derive(Debug, Default)]
pub struct ModuleReport {
    pub findings: Vec<Finding>,
    pub checks: u64,
    pub requests_made: u64,
}

impl ModuleReport {
    pub fn add_vulnerability(&mut self, finding: Finding) {
        warn!(kind = %finding.kind, issue = %finding.issue, "vulnerability found");
        self.checks += 1;
        self.findings.push(finding);
    }

    pub fn add_warning(&mut self, message: impl Into<String>, evidence: impl Into<String>) {
        let message = message.into();
        info!(%message, "warning");
        self.findings.push(Finding::warning(message, evidence));
    }

    pub fn add_info(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "info");
        self.findings.push(Finding::info(message));
    }

    pub fn vulnerability_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.category == Category::Vulnerability)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.category == Category::Warning)
            .count()
    }
}

/// Map every submittable field of a form to the probe value, skipping
/// submit/button controls.
pub(crate) fn form_probe_fields(form: &DiscoveredForm, value: &str) -> Vec<(String, String)> {
    form.inputs
        .iter()
        .filter(|field| field.field_type != "submit" && field.field_type != "button")
        .map(|field| (field.name.clone(), value.to_string()))
        .collect()
}

/// Resolve a form action against the scan target. An empty or unresolvable
/// action submits to the target itself.
pub(crate) fn resolve_action(target: &str, action: &str) -> String {
    if action.is_empty() {
        return target.to_string();
    }
    match Url::parse(target).and_then(|base| base.join(action)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => target.to_string(),
    }
}

/// Append fields to a URL as an encoded query string.
pub(crate) fn url_with_query(action_url: &str, fields: &[(String, String)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    format!("{}?{}", action_url, query)
}

/// Distinct query parameter names of a URL, first-occurrence order.
pub(crate) fn query_param_names(url: &Url) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, _) in url.query_pairs() {
        let name = name.into_owned();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Rebuild a URL with every value of `param` replaced by `value`, other
/// parameters preserved in order.
pub(crate) fn url_with_param_replaced(url: &Url, param: &str, value: &str) -> String {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, original) in url.query_pairs() {
        if name == param {
            serializer.append_pair(&name, value);
        } else {
            serializer.append_pair(&name, &original);
        }
    }
    format!("{}?{}", base, serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::FormField;
    use crate::types::Risk;

    fn sample_form() -> DiscoveredForm {
        DiscoveredForm {
            action: "/search".to_string(),
            method: "get".to_string(),
            enctype: String::new(),
            inputs: vec![
                FormField {
                    name: "q".to_string(),
                    field_type: "text".to_string(),
                    value: String::new(),
                    id: String::new(),
                },
                FormField {
                    name: "go".to_string(),
                    field_type: "submit".to_string(),
                    value: "Search".to_string(),
                    id: String::new(),
                },
            ],
        }
    }

    #[test]
    fn probe_fields_skip_submit_controls() {
        let fields = form_probe_fields(&sample_form(), "PROBE");
        assert_eq!(fields, vec![("q".to_string(), "PROBE".to_string())]);
    }

    #[test]
    fn action_resolution_falls_back_to_target() {
        assert_eq!(
            resolve_action("http://t.example/page", "/search"),
            "http://t.example/search"
        );
        assert_eq!(
            resolve_action("http://t.example/page", ""),
            "http://t.example/page"
        );
    }

    #[test]
    fn param_replacement_preserves_other_pairs() {
        let url = Url::parse("http://t.example/item?id=3&sort=asc").unwrap();
        let rebuilt = url_with_param_replaced(&url, "id", "' OR 1=1--");
        assert!(rebuilt.starts_with("http://t.example/item?"));
        assert!(rebuilt.contains("sort=asc"));
        assert!(!rebuilt.contains("id=3"));
    }

    #[test]
    fn checks_counter_tracks_vulnerabilities_only() {
        let mut report = ModuleReport::default();
        report.add_info("note");
        report.add_warning("careful", "");
        assert_eq!(report.checks, 0);
        report.add_vulnerability(Finding::vulnerability(
            "XSS",
            "issue",
            Risk::High,
            0.9,
            "",
            "",
        ));
        assert_eq!(report.checks, 1);
        assert_eq!(report.vulnerability_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn query_param_names_dedupe_in_order() {
        let url = Url::parse("http://t.example/?b=1&a=2&b=3").unwrap();
        assert_eq!(query_param_names(&url), ["b", "a"]);
    }
}
