//! Exporter command line.
//!
//! Every flag can also be given through the environment, which is how the
//! exporter is usually configured when it runs as a sidecar next to a
//! node. Anything not given falls back to `chain::ExporterConfig::default()`.

use std::net::SocketAddr;
use std::time::Duration;

use chain::{ConfigError, ConstLabels, ExporterConfig};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "exporter",
    version,
    about = "On-demand Prometheus exporter for Cosmos-based chains"
)]
pub struct Cli {
    /// Base URL of the node's REST gateway.
    #[arg(long, env = "NODE_URL", default_value = "http://127.0.0.1:1317")]
    pub node_url: String,

    /// Address to serve the metrics endpoints on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:9300")]
    pub listen: SocketAddr,

    /// Chain id attached to every gauge as the `chain_id` label.
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: String,

    /// Network name attached to every gauge as the `network` label.
    #[arg(long, env = "NETWORK", default_value = "mainnet")]
    pub network: String,

    /// Extra constant label, as `key=value`. May be repeated.
    #[arg(long = "const-label", value_name = "KEY=VALUE")]
    pub const_labels: Vec<String>,

    /// Timeout for a single call to the node, in seconds.
    #[arg(long, env = "NODE_TIMEOUT_SECS", default_value_t = 5)]
    pub node_timeout_secs: u64,

    /// Deadline for a whole scrape, in seconds.
    #[arg(long, env = "SCRAPE_TIMEOUT_SECS", default_value_t = 10)]
    pub scrape_timeout_secs: u64,

    /// Blocks between the two headers used to estimate block time.
    #[arg(long, env = "SAMPLE_WINDOW", default_value_t = 100)]
    pub sample_window: i64,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Builds and validates the exporter configuration.
    pub fn into_config(self) -> Result<ExporterConfig, ConfigError> {
        let mut const_labels = ConstLabels::deployment(&self.chain_id, &self.network)?;
        for pair in &self.const_labels {
            const_labels.insert_pair(pair)?;
        }

        let mut cfg = ExporterConfig::default();
        cfg.node.base_url = self.node_url;
        cfg.node.timeout = Duration::from_secs(self.node_timeout_secs);
        cfg.chain_status.sample_window = self.sample_window;
        cfg.metrics.listen_addr = self.listen;
        cfg.metrics.const_labels = const_labels;
        cfg.scrape_timeout = Duration::from_secs(self.scrape_timeout_secs);

        cfg.validate()?;
        Ok(cfg)
    }
}
