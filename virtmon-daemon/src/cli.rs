//! Command-line flags.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use virtmon_core::ExporterConfig;

#[derive(Parser, Debug)]
#[command(
    name = "virtmond",
    version,
    about = "Prometheus exporter for libvirt guests and storage pools"
)]
pub struct Args {
    /// JSON configuration file. Flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on for HTTP requests.
    #[arg(long = "web.listen-address", value_name = "ADDR")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", value_name = "PATH")]
    pub telemetry_path: Option<String>,

    /// Hypervisor connection URI.
    #[arg(long = "libvirt.uri", value_name = "URI")]
    pub uri: Option<String>,

    /// Guests and pools collected in parallel.
    #[arg(long = "scrape.concurrency", value_name = "N")]
    pub scrape_concurrency: Option<usize>,

    /// Scrape deadline in seconds.
    #[arg(long = "scrape.timeout", value_name = "SECONDS")]
    pub scrape_timeout: Option<u64>,

    /// Log filter when RUST_LOG is unset (e.g. info, debug, virtmon_core=trace).
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Scrape once, print the exposition to stdout and exit.
    #[arg(long)]
    pub once: bool,
}

impl Args {
    /// Defaults, then the config file, then flags.
    pub fn resolve_config(&self) -> anyhow::Result<ExporterConfig> {
        let mut config = ExporterConfig::load_or_default(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(v) = &self.listen_address {
            config.listen_address = v.clone();
        }
        if let Some(v) = &self.telemetry_path {
            config.telemetry_path = v.clone();
        }
        if let Some(v) = &self.uri {
            config.uri = v.clone();
        }
        if let Some(v) = self.scrape_concurrency {
            config.scrape_concurrency = v;
        }
        if let Some(v) = self.scrape_timeout {
            config.scrape_timeout_secs = v;
        }
        if let Some(v) = &self.log_level {
            config.log_level = v.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
