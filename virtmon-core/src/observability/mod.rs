//! Observability infrastructure: tracing, self-metrics, health checks.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod health;
pub mod metrics;

/// Initialize logging and the self-metrics recorder.
///
/// `RUST_LOG` takes precedence over `log_level`. Call once at startup; the
/// returned handle renders the self-metrics in Prometheus text format.
pub fn init(log_level: &str) -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .try_init()?;

    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::register_exporter_metrics();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Observability initialized");
    Ok(handle)
}
