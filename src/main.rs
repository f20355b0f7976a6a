// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use korento::config::AppConfig;
use korento::registry::ScanRegistry;
use korento::server;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!();
    println!("  _                         _");
    println!(" | | _____  _ __ ___ _ __ | |_ ___");
    println!(" | |/ / _ \\| '__/ _ \\ '_ \\| __/ _ \\");
    println!(" |   < (_) | | |  __/ | | | || (_) |");
    println!(" |_|\\_\\___/|_|  \\___|_| |_|\\__\\___/");
    println!();
    println!("        Web Security Scan Engine v2.0");
    println!();

    info!("Korento scan engine starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("korento-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let config = AppConfig::from_env()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        max_concurrent_scans = config.scanner.max_concurrent_scans,
        "Configuration loaded"
    );

    let registry = Arc::new(ScanRegistry::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    server::run_server(config, registry, events_tx, events_rx).await
}
