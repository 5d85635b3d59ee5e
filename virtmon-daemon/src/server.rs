//! HTTP surface: metrics, health and an index page.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use virtmon_core::exposition;
use virtmon_core::observability::metrics;
use virtmon_core::telemetry::derived;
use virtmon_core::{HealthChecker, HealthStatus, ScrapeReport, Scraper};

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    pub health: HealthChecker,
    pub self_metrics: Option<PrometheusHandle>,
    pub scrape_timeout: Duration,
    pub telemetry_path: String,
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    let telemetry_path = state.telemetry_path.clone();
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route(&telemetry_path, get(handle_metrics))
        .with_state(state)
}

/// Run one scrape under the deadline and record its outcome in `health`.
pub async fn scrape_once(
    scraper: &Scraper,
    health: &HealthChecker,
    deadline: Duration,
) -> ScrapeReport {
    let report = match tokio::time::timeout(deadline, scraper.scrape()).await {
        Ok(report) => report,
        Err(_) => {
            warn!(uri = %scraper.uri(), timeout_secs = deadline.as_secs(), "Scrape timed out");
            metrics::record_scrape(deadline.as_secs_f64(), "timeout");
            ScrapeReport { measurements: vec![derived::up(false)], ..Default::default() }
        }
    };

    let (status, message) = health_of(&report);
    health.record(status, message).await;
    report
}

fn health_of(report: &ScrapeReport) -> (HealthStatus, Option<String>) {
    if !report.up {
        (HealthStatus::Unhealthy, Some("last scrape could not reach the hypervisor".to_string()))
    } else if report.guests_failed > 0 || report.pools_failed > 0 {
        (
            HealthStatus::Degraded,
            Some(format!(
                "last scrape dropped {} guest(s) and {} pool(s)",
                report.guests_failed, report.pools_failed
            )),
        )
    } else {
        (HealthStatus::Healthy, None)
    }
}

async fn handle_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let report = scrape_once(&state.scraper, &state.health, state.scrape_timeout).await;
    let mut body = exposition::render(&report.measurements);
    if let Some(handle) = &state.self_metrics {
        body.push_str(&handle.render());
    }
    ([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body)
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.health.report().await;
    let code = match health.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (code, Json(health))
}

async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>libvirt exporter</title></head>\n<body>\n<h1>libvirt exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n<p><a href=\"/health\">Health</a></p>\n\
         </body>\n</html>\n",
        path = state.telemetry_path
    ))
}
