//! Exporter self-metrics.
//!
//! All metrics follow Prometheus naming conventions:
//! - `_total` suffix for counters
//! - `_seconds` suffix for histograms measuring duration

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Register all self-metrics with descriptions.
pub fn register_exporter_metrics() {
    describe_histogram!("virtmon_scrape_duration_seconds", "Duration of a full scrape cycle");
    describe_counter!(
        "virtmon_scrapes_total",
        "Scrape cycles (by outcome: success, failure, timeout)"
    );
    describe_counter!(
        "virtmon_guest_failures_total",
        "Guests dropped from a scrape (by error kind)"
    );
    describe_counter!("virtmon_pool_failures_total", "Storage pools dropped from a scrape");
    describe_counter!(
        "virtmon_soft_failures_total",
        "Measurement groups skipped (by group and reason: unsupported, invalid_state)"
    );
    describe_gauge!("virtmon_last_scrape_guests", "Guests collected by the last successful scrape");
}

pub fn record_scrape(duration_secs: f64, outcome: &str) {
    histogram!("virtmon_scrape_duration_seconds").record(duration_secs);
    counter!("virtmon_scrapes_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_guest_failure(kind: &str) {
    counter!("virtmon_guest_failures_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_pool_failure() {
    counter!("virtmon_pool_failures_total").increment(1);
}

pub fn record_soft_failure(group: &str, reason: &str) {
    counter!(
        "virtmon_soft_failures_total",
        "group" => group.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn set_last_scrape_guests(count: usize) {
    gauge!("virtmon_last_scrape_guests").set(count as f64);
}
