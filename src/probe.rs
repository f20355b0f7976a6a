// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - HTTP Probe Client
 * Per-scan HTTP session with timeout, randomized delay and request counting
 */

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::ModuleConfig;

/// Timeout applied to the CORS preflight probe only.
const PREFLIGHT_TIMEOUT_SECS: u64 = 10;

/// One HTTP session owned by one detection module. Certificate validation is
/// disabled: the engine is routinely pointed at staging hosts with
/// self-signed certificates.
#[derive(Clone)]
pub struct ProbeClient {
    client: Client,
    random_delay: bool,
    delay_range: (f64, f64),
    requests_made: Arc<AtomicU64>,
}

impl ProbeClient {
    pub fn new(config: &ModuleConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .expect("static header value"),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().expect("static header value"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .default_headers(headers)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            random_delay: config.random_delay,
            delay_range: config.delay_range,
            requests_made: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Number of requests that received any response.
    pub fn requests_made(&self) -> u64 {
        self.requests_made.load(Ordering::Relaxed)
    }

    /// Randomized pause between probes. No-op when delays are disabled.
    pub async fn delay(&self) {
        if !self.random_delay {
            return;
        }
        let (lo, hi) = self.delay_range;
        if hi <= lo {
            return;
        }
        let secs = {
            use rand::Rng;
            rand::rng().random_range(lo..hi)
        };
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    /// GET the given URL. A timeout, refused connection, or transport error
    /// is an `Err` the caller skips over; it never terminates a scan.
    pub async fn fetch(&self, url: &str) -> Result<ProbeResponse> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        self.finish(url, started, response).await
    }

    /// Submit a form-encoded POST.
    pub async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<ProbeResponse> {
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        self.finish(url, started, response).await
    }

    /// Preflight-style OPTIONS request with caller-supplied headers, used by
    /// the cross-origin policy audit.
    pub async fn options_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<ProbeResponse> {
        let started = Instant::now();
        let mut request = self
            .client
            .request(reqwest::Method::OPTIONS, url)
            .timeout(Duration::from_secs(PREFLIGHT_TIMEOUT_SECS));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("OPTIONS {} failed", url))?;
        self.finish(url, started, response).await
    }

    async fn finish(
        &self,
        url: &str,
        started: Instant,
        response: reqwest::Response,
    ) -> Result<ProbeResponse> {
        let status_code = response.status().as_u16();

        let mut headers = HashMap::with_capacity(response.headers().len());
        let mut set_cookies = Vec::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                if name == &reqwest::header::SET_COOKIE {
                    set_cookies.push(value_str.to_string());
                }
                headers.insert(name.as_str().to_lowercase(), value_str.to_string());
            }
        }

        let body = response.text().await.unwrap_or_default();
        let duration_ms = started.elapsed().as_millis() as u64;

        self.requests_made.fetch_add(1, Ordering::Relaxed);
        debug!(url, status_code, duration_ms, "probe completed");

        Ok(ProbeResponse {
            status_code,
            body,
            headers,
            set_cookies,
            duration_ms,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status_code: u16,
    pub body: String,
    /// Header names lowercased; repeated headers collapse except Set-Cookie,
    /// which is preserved in full in `set_cookies`.
    pub headers: HashMap<String, String>,
    pub set_cookies: Vec<String>,
    pub duration_ms: u64,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.body.contains(pattern)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_header(name: &str, value: &str) -> ProbeResponse {
        let mut headers = HashMap::new();
        headers.insert(name.to_lowercase(), value.to_string());
        ProbeResponse {
            status_code: 200,
            body: String::new(),
            headers,
            set_cookies: Vec::new(),
            duration_ms: 0,
        }
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = response_with_header("Access-Control-Allow-Origin", "*");
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[tokio::test]
    async fn delay_is_noop_when_disabled() {
        let client = ProbeClient::new(&ModuleConfig::without_delay()).unwrap();
        let started = Instant::now();
        client.delay().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
