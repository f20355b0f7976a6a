// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Request-Forgery Policy Auditor (CSRF)
 * Per-form token audit, cookie policy audit and cross-origin policy audit
 */

use anyhow::Result;
use scraper::{Html, Selector};
use tracing::info;

use crate::config::ModuleConfig;
use crate::payloads::{
    ANALYTICS_COOKIES, CRITICAL_FORM_KEYWORDS, CRITICAL_FORM_TEXT_KEYWORDS,
    CRITICAL_INPUT_KEYWORDS, CSRF_TOKEN_KEYWORDS, SENSITIVE_COOKIE_NAMES,
};
use crate::probe::{ProbeClient, ProbeResponse};
use crate::scanners::ModuleReport;
use crate::surface::{self, DiscoveredForm};
use crate::types::{Finding, Risk};

/// Token value length at or above which a hidden token counts as strong.
const STRONG_TOKEN_LEN: usize = 16;
/// Token value length below which a weak-token warning is raised.
const WEAK_TOKEN_LEN: usize = 10;
const MAX_LISTED_ISSUES: usize = 3;
const MAX_LISTED_WARNINGS: usize = 2;
const SPOOFED_ORIGIN: &str = "https://evil-attacker.com";

pub struct CsrfScanner {
    client: ProbeClient,
    target: String,
}

impl CsrfScanner {
    pub fn new(target: impl Into<String>, config: &ModuleConfig) -> Result<Self> {
        Ok(Self {
            client: ProbeClient::new(config)?,
            target: target.into(),
        })
    }

    pub async fn scan(&self) -> Result<ModuleReport> {
        info!(target = %self.target, "Starting CSRF scan");
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

        let mut csrf_forms_found = 0;
        for form in &surface.forms {
            if analyze_form(form, &main_page.body, &mut report) {
                csrf_forms_found += 1;
            }
        }

        // The cookie audit only matters once a form-level weakness exists.
        if csrf_forms_found > 0 {
            self.check_cookie_security(&mut report).await;
        }

        self.check_cors_headers(&mut report).await;

        report.requests_made = self.client.requests_made();
        Ok(report)
    }

    async fn check_cookie_security(&self, report: &mut ModuleReport) {
        match self.client.fetch(&self.target).await {
            Ok(response) => {
                let https = self.target.starts_with("https://");
                audit_cookies(&response.set_cookies, https, report);
            }
            Err(_) => {
                report.add_info("Could not analyze cookies due to connection issue");
            }
        }
    }

    async fn check_cors_headers(&self, report: &mut ModuleReport) {
        let headers = [
            ("Origin", SPOOFED_ORIGIN),
            ("Access-Control-Request-Method", "POST"),
            ("Access-Control-Request-Headers", "X-Requested-With"),
        ];
        if let Ok(response) = self.client.options_with_headers(&self.target, &headers).await {
            audit_cors_response(&response, report);
        }
    }
}

struct TokenInfo {
    name: String,
    value_length: usize,
    is_hidden: bool,
}

/// Audit one form's anti-forgery posture. Returns true when a critical
/// finding was raised for it.
fn analyze_form(form: &DiscoveredForm, html: &str, report: &mut ModuleReport) -> bool {
    if form.method != "post" {
        report.add_info(format!(
            "Form {} uses GET method - less critical for CSRF",
            form.action
        ));
        return false;
    }

    let is_critical = is_critical_form(form, html);

    let tokens: Vec<TokenInfo> = form
        .inputs
        .iter()
        .filter(|input| {
            let name = input.name.to_lowercase();
            CSRF_TOKEN_KEYWORDS.iter().any(|keyword| name.contains(keyword))
        })
        .map(|input| TokenInfo {
            name: input.name.clone(),
            value_length: input.value.len(),
            is_hidden: input.field_type == "hidden",
        })
        .collect();

    if !tokens.is_empty() {
        report.add_info(format!(
            "Form {} has {} CSRF token(s)",
            form.action,
            tokens.len()
        ));

        let mut strong_tokens = 0;
        for token in &tokens {
            if token.value_length >= STRONG_TOKEN_LEN && token.is_hidden {
                strong_tokens += 1;
            } else if token.value_length < WEAK_TOKEN_LEN {
                report.add_warning(
                    format!(
                        "Weak CSRF token found: {} (length: {})",
                        token.name, token.value_length
                    ),
                    "",
                );
            }
        }

        if strong_tokens == 0 && is_critical {
            report.add_vulnerability(Finding::vulnerability(
                "CSRF",
                "Weak or missing CSRF protection in critical form",
                Risk::Medium,
                0.7,
                format!("Form {} has weak CSRF tokens", form.action),
                form.action.clone(),
            ));
            return true;
        }
    } else if is_critical {
        report.add_vulnerability(Finding::vulnerability(
            "CSRF",
            "Missing CSRF protection in critical form",
            Risk::Medium,
            0.8,
            format!("No CSRF token found in form: {}", form.action),
            form.action.clone(),
        ));
        return true;
    } else {
        report.add_info(format!(
            "Form {} has no CSRF token (non-critical form)",
            form.action
        ));
    }

    false
}

/// A form is critical when its action, field names/types or visible text
/// suggest a security-sensitive operation.
fn is_critical_form(form: &DiscoveredForm, html: &str) -> bool {
    let action = form.action.to_lowercase();
    if CRITICAL_FORM_KEYWORDS.iter().any(|keyword| action.contains(keyword)) {
        return true;
    }

    for input in &form.inputs {
        if input.field_type.to_lowercase() == "password" {
            return true;
        }
        let name = input.name.to_lowercase();
        if CRITICAL_INPUT_KEYWORDS.iter().any(|keyword| name.contains(keyword)) {
            return true;
        }
    }

    if let Some(text) = form_visible_text(html, &form.action) {
        let text = text.to_lowercase();
        if CRITICAL_FORM_TEXT_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            return true;
        }
    }

    false
}

/// Visible text of the form element with the given action attribute.
fn form_visible_text(html: &str, action: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("form").expect("static selector");
    document
        .select(&selector)
        .find(|element| element.value().attr("action").unwrap_or("") == action)
        .map(|element| element.text().collect::<String>())
}

/// Audit Set-Cookie policy. Issues aggregate into a single low-risk
/// finding; softer problems into a single warning.
fn audit_cookies(set_cookies: &[String], https: bool, report: &mut ModuleReport) {
    let cookies: Vec<CookieRecord> = set_cookies.iter().map(|raw| parse_set_cookie(raw)).collect();
    if cookies.is_empty() {
        report.add_info("No cookies found");
        return;
    }

    let mut security_issues: Vec<String> = Vec::new();
    let mut warning_issues: Vec<String> = Vec::new();

    for cookie in &cookies {
        let name_lower = cookie.name.to_lowercase();
        if ANALYTICS_COOKIES.iter().any(|skip| name_lower.contains(skip)) {
            continue;
        }

        if https && !cookie.secure {
            security_issues.push(format!(
                "Cookie '{}' missing Secure flag on HTTPS site",
                cookie.name
            ));
        }

        if !cookie.http_only {
            if SENSITIVE_COOKIE_NAMES
                .iter()
                .any(|sensitive| name_lower.contains(sensitive))
            {
                security_issues.push(format!(
                    "Sensitive cookie '{}' missing HttpOnly flag",
                    cookie.name
                ));
            } else {
                warning_issues.push(format!("Cookie '{}' missing HttpOnly flag", cookie.name));
            }
        }

        match cookie.same_site.as_deref() {
            None => {
                warning_issues.push(format!(
                    "Cookie '{}' missing SameSite attribute",
                    cookie.name
                ));
            }
            Some("none") => {
                if https && !cookie.secure {
                    security_issues.push(format!(
                        "Cookie '{}' has SameSite=None without Secure flag",
                        cookie.name
                    ));
                }
            }
            Some(_) => {}
        }
    }

    if !security_issues.is_empty() {
        report.add_vulnerability(Finding::vulnerability(
            "Cookie Security",
            "Insecure cookie configuration",
            Risk::Low,
            0.7,
            security_issues
                .iter()
                .take(MAX_LISTED_ISSUES)
                .cloned()
                .collect::<Vec<_>>()
                .join("; "),
            "Cookies",
        ));
    }

    if !warning_issues.is_empty() {
        report.add_warning(
            "Non-critical cookie security issues detected",
            warning_issues
                .iter()
                .take(MAX_LISTED_WARNINGS)
                .cloned()
                .collect::<Vec<_>>()
                .join("; "),
        );
    }

    report.add_info(format!("Analyzed {} cookies for security", cookies.len()));
}

/// Inspect the preflight response for permissive cross-origin policy.
fn audit_cors_response(response: &ProbeResponse, report: &mut ModuleReport) {
    let allow_origin = response
        .header("access-control-allow-origin")
        .unwrap_or("")
        .to_string();

    if allow_origin == "*" {
        report.add_warning("CORS policy allows any origin (*)", "");
    } else if allow_origin.contains("evil-attacker.com") {
        report.add_vulnerability(Finding::vulnerability(
            "CORS Misconfiguration",
            "CORS policy allows arbitrary origins",
            Risk::Medium,
            0.6,
            format!("Access-Control-Allow-Origin: {}", allow_origin),
            "CORS",
        ));
    }

    let allow_credentials = response
        .header("access-control-allow-credentials")
        .unwrap_or("");
    if allow_credentials.eq_ignore_ascii_case("true") && allow_origin == "*" {
        report.add_vulnerability(Finding::vulnerability(
            "CORS Misconfiguration",
            "CORS allows credentials with wildcard origin",
            Risk::High,
            0.8,
            "Allow-Credentials: true with wildcard origin",
            "CORS",
        ));
    }
}

struct CookieRecord {
    name: String,
    secure: bool,
    http_only: bool,
    same_site: Option<String>,
}

/// Minimal Set-Cookie parser: name plus the three policy attributes the
/// audit cares about.
fn parse_set_cookie(raw: &str) -> CookieRecord {
    let mut segments = raw.split(';').map(str::trim);
    let name = segments
        .next()
        .and_then(|pair| pair.split('=').next())
        .unwrap_or("")
        .to_string();

    let mut secure = false;
    let mut http_only = false;
    let mut same_site = None;

    for segment in segments {
        let lowered = segment.to_lowercase();
        if lowered == "secure" {
            secure = true;
        } else if lowered == "httponly" {
            http_only = true;
        } else if let Some(value) = lowered.strip_prefix("samesite=") {
            same_site = Some(value.to_string());
        }
    }

    CookieRecord {
        name,
        secure,
        http_only,
        same_site,
    }
}
