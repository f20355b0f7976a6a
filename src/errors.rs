// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Boundary Error Types
 * Typed errors surfaced at the scan API boundary
 */

use thiserror::Error;

/// Errors returned to callers of the scan API. Probe-level and module-level
/// failures never reach this type; they degrade into warnings inside the
/// report instead.
#[derive(Error, Debug)]
pub enum ScanApiError {
    #[error("Target URL is required")]
    MissingTarget,

    #[error("URL must start with http:// or https://")]
    InvalidScheme,

    #[error("Scanning local addresses is not allowed")]
    BlockedTarget,

    #[error("Invalid target URL: {0}")]
    MalformedTarget(#[from] url::ParseError),

    #[error("Scan results not found")]
    NotFound,
}

impl ScanApiError {
    /// HTTP status the front end maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            ScanApiError::NotFound => 404,
            _ => 400,
        }
    }
}
