//! Health tracking for the `/health` endpoint.
//!
//! The status follows the most recent scrape: unhealthy when the hypervisor
//! was unreachable, degraded when guests or pools were dropped.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Body of the `/health` response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Shared view of the last scrape outcome; cloning shares the state.
#[derive(Clone)]
pub struct HealthChecker {
    last: Arc<RwLock<(HealthStatus, Option<String>)>>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self { last: Arc::new(RwLock::new((HealthStatus::Healthy, None))) }
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, status: HealthStatus, message: Option<String>) {
        *self.last.write().await = (status, message);
    }

    pub async fn report(&self) -> HealthReport {
        let (status, message) = self.last.read().await.clone();
        HealthReport { status, version: env!("CARGO_PKG_VERSION"), message }
    }
}
