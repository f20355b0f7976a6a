// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Platform Configuration
 * Environment-driven configuration with validated defaults
 */

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,

    #[validate(nested)]
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    #[serde(default = "default_host")]
    pub host: String,

    #[validate(range(min = 1024, max = 65535))]
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScannerConfig {
    /// Per-module HTTP timeout in seconds.
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on total scan wall-clock, informational only.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,

    /// Soft cap on simultaneous scans. Present in configuration but not
    /// enforced by the coordinator, which has no cross-session awareness.
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_max_concurrent_scans")]
    pub max_concurrent_scans: usize,

    /// Randomized inter-request delay bounds, seconds.
    #[serde(default = "default_delay_range")]
    pub delay_range: (f64, f64),
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_scan_timeout() -> u64 {
    300
}

fn default_max_concurrent_scans() -> usize {
    3
}

fn default_delay_range() -> (f64, f64) {
    (1.0, 3.0)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            scanner: ScannerConfig::default(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            scan_timeout_secs: default_scan_timeout(),
            max_concurrent_scans: default_max_concurrent_scans(),
            delay_range: default_delay_range(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = AppConfig::default();

        if let Ok(host) = std::env::var("KORENTO_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("KORENTO_PORT") {
            config.server.port = port.parse()?;
        }
        if let Ok(timeout) = std::env::var("KORENTO_REQUEST_TIMEOUT") {
            config.scanner.request_timeout_secs = timeout.parse()?;
        }
        if let Ok(max) = std::env::var("KORENTO_MAX_CONCURRENT_SCANS") {
            config.scanner.max_concurrent_scans = max.parse()?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Per-module probe configuration handed out by the coordinator.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    pub timeout_secs: u64,
    pub random_delay: bool,
    pub delay_range: (f64, f64),
}

impl ModuleConfig {
    pub fn new(timeout_secs: u64, random_delay: bool, delay_range: (f64, f64)) -> Self {
        Self {
            timeout_secs,
            random_delay,
            delay_range,
        }
    }

    /// Configuration used by unit and integration tests: no delays.
    pub fn without_delay() -> Self {
        Self {
            timeout_secs: 30,
            random_delay: false,
            delay_range: (0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.scanner.request_timeout_secs, 30);
        assert_eq!(config.scanner.max_concurrent_scans, 3);
        assert_eq!(config.scanner.delay_range, (1.0, 3.0));
    }
}
