// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - HTTP Front End
 * Thin routing layer over the coordinator and registry
 */

use std::net::IpAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{error, info};
use url::Url;

use crate::config::AppConfig;
use crate::coordinator::{generate_scan_id, ScanCoordinator};
use crate::errors::ScanApiError;
use crate::registry::ScanRegistry;
use crate::types::ScanEvent;

const PLATFORM_VERSION: &str = "2.0.0";

/// Hostname fragments that are never valid scan targets.
const LOCAL_INDICATORS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "192.168.", "10."];

pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<ScanRegistry>,
    pub events: mpsc::UnboundedSender<ScanEvent>,
}

/// Reject anything that is not an absolute http(s) URL to a public host.
pub fn validate_target(target: &str) -> Result<(), ScanApiError> {
    if target.is_empty() {
        return Err(ScanApiError::MissingTarget);
    }
    if !(target.starts_with("http://") || target.starts_with("https://")) {
        return Err(ScanApiError::InvalidScheme);
    }
    if LOCAL_INDICATORS
        .iter()
        .any(|indicator| target.contains(indicator))
    {
        return Err(ScanApiError::BlockedTarget);
    }

    let parsed = Url::parse(target)?;
    if let Some(host) = parsed.host_str() {
        if let Ok(address) = host.parse::<IpAddr>() {
            let blocked = match address {
                IpAddr::V4(v4) => {
                    v4.is_loopback() || v4.is_private() || v4.is_unspecified() || v4.is_link_local()
                }
                IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
            };
            if blocked {
                return Err(ScanApiError::BlockedTarget);
            }
        }
    }

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/scan", post(start_scan))
        .route("/api/results/:scan_id", get(scan_results))
        .route("/api/status", get(platform_status))
        .route("/api/scanners", get(scanner_catalog))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the API until the process exits. Also spawns the event logger that
/// drains the progress channel.
pub async fn run_server(
    config: AppConfig,
    registry: Arc<ScanRegistry>,
    events: mpsc::UnboundedSender<ScanEvent>,
    events_rx: mpsc::UnboundedReceiver<ScanEvent>,
) -> anyhow::Result<()> {
    spawn_event_logger(events_rx);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState {
        config,
        registry,
        events,
    });

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Consume scan events as they arrive. Events are one-way notifications;
/// losing them never affects a scan.
pub fn spawn_event_logger(mut events_rx: mpsc::UnboundedReceiver<ScanEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(serialized) => info!(event = %serialized, "scan event"),
                Err(err) => error!(%err, "unserializable scan event"),
            }
        }
    });
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    #[serde(default)]
    target: Option<String>,
}

fn api_error(error: &ScanApiError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

async fn start_scan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanRequest>,
) -> Response {
    let target = match request.target.as_deref().map(str::trim) {
        Some(target) if !target.is_empty() => target.to_string(),
        _ => return api_error(&ScanApiError::MissingTarget),
    };

    if let Err(err) = validate_target(&target) {
        return api_error(&err);
    }

    let scan_id = generate_scan_id(&target);
    state.registry.register_active(&scan_id, &target);
    spawn_scan_task(state.clone(), scan_id.clone(), target.clone());

    (
        StatusCode::OK,
        Json(json!({
            "scan_id": scan_id,
            "message": "Security scan started successfully",
            "target": target,
            "status": "running",
            "scanners": ["XSS", "SQL Injection", "IDOR", "CSRF"],
            "estimated_time": "1-3 minutes",
        })),
    )
        .into_response()
}

/// One task per scan. A panic inside the scan task is the only condition
/// that aborts a whole scan; it is recorded as a failed entry and published
/// on the failure channel instead of producing a report.
fn spawn_scan_task(state: Arc<AppState>, scan_id: String, target: String) {
    tokio::spawn(async move {
        let coordinator = ScanCoordinator::new(state.config.scanner.clone())
            .with_events(state.events.clone());

        let scan = tokio::spawn({
            let scan_id = scan_id.clone();
            let target = target.clone();
            async move { coordinator.run(scan_id, target).await }
        });

        match scan.await {
            Ok(report) => {
                let summary = report.summary.clone();
                state.registry.store_report(report);
                if let Some(summary) = summary {
                    let _ = state.events.send(ScanEvent::ScanComplete {
                        scan_id,
                        target,
                        summary,
                        timestamp: chrono::Utc::now().to_rfc3339(),
                    });
                }
            }
            Err(join_error) => {
                let message = join_error.to_string();
                error!(%scan_id, %message, "scan aborted");
                state.registry.store_failure(&scan_id, &message);
                let _ = state.events.send(ScanEvent::ScanError {
                    scan_id,
                    target,
                    error: message,
                });
            }
        }
    });
}

async fn scan_results(
    State(state): State<Arc<AppState>>,
    Path(scan_id): Path<String>,
) -> Response {
    match state.registry.get(&scan_id) {
        Some(stored) => (StatusCode::OK, Json(stored)).into_response(),
        None => api_error(&ScanApiError::NotFound),
    }
}

async fn platform_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "version": PLATFORM_VERSION,
        "platform": "Korento Security Scanner",
        "active_scans": state.registry.active_count(),
        "completed_scans": state.registry.completed_count(),
        "scanners_available": ["XSS", "SQL Injection", "IDOR", "CSRF"],
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn scanner_catalog() -> Json<serde_json::Value> {
    Json(json!({
        "scanners": {
            "xss": {
                "name": "XSS Scanner",
                "description": "Detects Cross-Site Scripting vulnerabilities",
                "techniques": ["Reflected XSS"],
                "payloads_count": 12,
                "risk_level": "High",
            },
            "sqli": {
                "name": "SQL Injection Scanner",
                "description": "Detects SQL Injection vulnerabilities",
                "techniques": ["Error-based", "Boolean-based", "Time-based"],
                "payloads_count": 7,
                "risk_level": "Critical",
            },
            "idor": {
                "name": "IDOR Scanner",
                "description": "Detects Insecure Direct Object References",
                "techniques": ["Parameter manipulation", "Path probing"],
                "test_cases": "Pattern detection",
                "risk_level": "High",
            },
            "csrf": {
                "name": "CSRF Scanner",
                "description": "Detects Cross-Site Request Forgery vulnerabilities",
                "techniques": ["Token analysis", "Cookie security", "CORS policy"],
                "test_cases": "Form analysis",
                "risk_level": "Medium",
            },
        }
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
