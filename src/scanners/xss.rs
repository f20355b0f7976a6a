// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Reflection Tester (XSS)
 * Injects a fixed payload corpus into forms and query parameters and checks
 * for verbatim, unescaped reflection in the response body
 */

use anyhow::Result;
use tracing::info;
use url::Url;

use crate::config::ModuleConfig;
use crate::payloads::XSS_PAYLOADS;
use crate::probe::ProbeClient;
use crate::scanners::{
    form_probe_fields, query_param_names, resolve_action, url_with_param_replaced, url_with_query,
    ModuleReport,
};
use crate::surface::{self, DiscoveredForm};
use crate::types::Finding;

const MAX_FORMS: usize = 3;
const MAX_URL_PARAMS: usize = 8;
const MAX_LINKS: usize = 5;
/// Echoed parameter values at or below this length are too short to matter.
const MIN_ECHO_LEN: usize = 3;

pub struct XssScanner {
    client: ProbeClient,
    target: String,
}

impl XssScanner {
    pub fn new(target: impl Into<String>, config: &ModuleConfig) -> Result<Self> {
        Ok(Self {
            client: ProbeClient::new(config)?,
            target: target.into(),
        })
    }

    pub async fn scan(&self) -> Result<ModuleReport> {
        info!(target = %self.target, "Starting XSS scan");
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

        for link in surface
            .links
            .iter()
            .filter(|link| link.has_params)
            .take(MAX_LINKS)
        {
            self.test_link(&link.url, &mut report).await;
        }

        report.requests_made = self.client.requests_made();
        Ok(report)
    }

    /// Inject every payload into every submittable field of one form.
    async fn test_form(&self, form: &DiscoveredForm, report: &mut ModuleReport) {
        let action_url = resolve_action(&self.target, &form.action);

        for payload in XSS_PAYLOADS {
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
                if response.is_success() && reflects_unescaped(payload.value, &response.body) {
                    report.add_vulnerability(Finding::vulnerability(
                        "XSS",
                        format!("Reflected XSS in form {}", form.action),
                        payload.risk,
                        0.9,
                        format!("Payload: {}", payload.value),
                        form.action.clone(),
                    ));
                }
            }

            self.client.delay().await;
        }
    }

    /// Inject every payload into each query parameter of the target URL.
    async fn test_url_parameters(&self, parsed: &Url, report: &mut ModuleReport) {
        for param in query_param_names(parsed).iter().take(MAX_URL_PARAMS) {
            for payload in XSS_PAYLOADS {
                let test_url = url_with_param_replaced(parsed, param, payload.value);

                if let Ok(response) = self.client.fetch(&test_url).await {
                    if response.is_success() && reflects_unescaped(payload.value, &response.body) {
                        report.add_vulnerability(Finding::vulnerability(
                            "XSS",
                            format!("Reflected XSS in URL parameter {}", param),
                            payload.risk,
                            0.85,
                            format!("Parameter: {}, Payload: {}", param, payload.value),
                            "URL parameters",
                        ));
                    }
                }

                self.client.delay().await;
            }
        }
    }

    /// Passive pass over a discovered link: flag parameter values echoed
    /// unescaped in the fetched page. Info-level only, no payload injected.
    async fn test_link(&self, link_url: &str, report: &mut ModuleReport) {
        let Ok(response) = self.client.fetch(link_url).await else {
            return;
        };
        if !response.is_success() {
            return;
        }
        let Ok(parsed) = Url::parse(link_url) else {
            return;
        };

        for param in query_param_names(&parsed) {
            let values: Vec<String> = parsed
                .query_pairs()
                .filter(|(name, _)| *name == param)
                .map(|(_, value)| value.into_owned())
                .take(2)
                .collect();

            for value in values {
                if value.len() > MIN_ECHO_LEN
                    && response.body.contains(&value)
                    && !response.body.contains(&encode_html(&value))
                {
                    report.add_info(format!(
                        "Reflected parameter found: {} in {}",
                        param,
                        truncate(link_url, 50)
                    ));
                }
            }
        }
    }
}

/// True when the raw payload appears in the body and none of the three
/// escaped renderings does. A body carrying only an escaped form is treated
/// as safely encoded output.
fn reflects_unescaped(payload: &str, body: &str) -> bool {
    body.contains(payload) && !is_encoded(payload, body)
}

fn is_encoded(payload: &str, body: &str) -> bool {
    let encoded_versions = [
        payload.replace('<', "&lt;").replace('>', "&gt;"),
        payload.replace('<', "&#60;").replace('>', "&#62;"),
        payload.replace('<', "%3C").replace('>', "%3E"),
    ];
    encoded_versions.iter().any(|encoded| body.contains(encoded))
}

fn encode_html(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
