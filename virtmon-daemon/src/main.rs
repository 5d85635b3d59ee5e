use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use virtmon_core::{
    exposition, init_observability, HealthChecker, LibvirtConnector, Scraper, WarningLog,
};

mod cli;
mod server;
mod shutdown;

/// Histogram buckets are drained by periodic upkeep.
const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    let config = args.resolve_config()?;

    // Initialize observability FIRST
    let self_metrics = init_observability(&config.log_level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize observability: {}", e))?;

    info!(uri = %config.uri, "virtmond starting");

    let connector = Arc::new(LibvirtConnector::new());
    let scraper = Arc::new(Scraper::from_config(connector, &config, WarningLog::new()));

    let health = HealthChecker::new();

    if args.once {
        let report = server::scrape_once(&scraper, &health, config.scrape_timeout()).await;
        print!("{}", exposition::render(&report.measurements));
        if !report.up {
            anyhow::bail!("scrape of {} failed", config.uri);
        }
        return Ok(());
    }

    let upkeep = {
        let handle = self_metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
            loop {
                interval.tick().await;
                handle.run_upkeep();
            }
        })
    };

    let state = server::AppState {
        scraper,
        health,
        self_metrics: Some(self_metrics),
        scrape_timeout: config.scrape_timeout(),
        telemetry_path: config.telemetry_path.clone(),
    };
    let app = server::build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, path = %config.telemetry_path, "Serving metrics");

    let result =
        axum::serve(listener, app).with_graceful_shutdown(shutdown::signal()).await;

    upkeep.abort();
    if let Err(e) = &result {
        error!("HTTP server failed: {}", e);
    }
    info!("virtmond shutting down");
    result.context("HTTP server failed")
}
