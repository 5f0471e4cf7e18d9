//! Top-level configuration for the exporter.
//!
//! This module aggregates configuration for:
//!
//! - the node query client (REST gateway URL + timeout),
//! - chain status sampling (how far back to look for block velocity),
//! - the metrics surface (listen address + constant deployment labels),
//! - the per-scrape deadline.
//!
//! `ExporterConfig` is built once at startup from defaults and CLI/env
//! overrides, then treated as immutable.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::metrics::{PROPOSAL_LABELS, UPGRADE_PLAN_LABELS};

/// Errors raised while assembling configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid label name {0:?}: must match [a-zA-Z_][a-zA-Z0-9_]* and not start with __")]
    InvalidLabelName(String),
    #[error("label name {0:?} is reserved by a metric family")]
    ReservedLabelName(String),
    #[error("malformed constant label {0:?}: expected key=value")]
    MalformedLabel(String),
    #[error("invalid node URL {url:?}: {reason}")]
    InvalidNodeUrl { url: String, reason: String },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Configuration for the node query client.
#[derive(Clone, Debug)]
pub struct NodeClientConfig {
    /// Base URL of the node's REST gateway, e.g. `"http://127.0.0.1:1317"`.
    pub base_url: String,
    /// Per-call timeout enforced by the HTTP client itself.
    pub timeout: Duration,
}

impl Default for NodeClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1317".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl NodeClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidNodeUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidNodeUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::NotPositive("node timeout"));
        }
        Ok(())
    }
}

/// Configuration for block velocity sampling.
#[derive(Clone, Debug)]
pub struct ChainStatusConfig {
    /// Number of blocks between the two headers used to derive the
    /// average block time.
    pub sample_window: i64,
}

impl Default for ChainStatusConfig {
    fn default() -> Self {
        Self { sample_window: 100 }
    }
}

/// Constant labels attached to every gauge the exporter emits.
///
/// These identify the deployment (chain id, network, ...) and are fixed
/// for the lifetime of the process. Keys are validated on insert, so a
/// `ConstLabels` value is always accepted by the Prometheus registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstLabels(BTreeMap<String, String>);

impl ConstLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard deployment identity: `chain_id` and `network`.
    pub fn deployment(chain_id: &str, network: &str) -> Result<Self, ConfigError> {
        let mut labels = Self::new();
        labels.insert("chain_id", chain_id)?;
        labels.insert("network", network)?;
        Ok(labels)
    }

    /// Inserts (or overwrites) a label after validating its name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        validate_label_name(&name)?;
        self.0.insert(name, value.into());
        Ok(())
    }

    /// Parses and inserts a `key=value` pair as given on the command line.
    pub fn insert_pair(&mut self, pair: &str) -> Result<(), ConfigError> {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedLabel(pair.to_string()))?;
        self.insert(name.trim(), value.trim())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy in the shape `prometheus::Opts::const_labels` expects.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.0.clone().into_iter().collect()
    }
}

fn validate_label_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_head || !valid_tail || name.starts_with("__") {
        return Err(ConfigError::InvalidLabelName(name.to_string()));
    }

    if PROPOSAL_LABELS.contains(&name) || UPGRADE_PLAN_LABELS.contains(&name) {
        return Err(ConfigError::ReservedLabelName(name.to_string()));
    }
    Ok(())
}

/// Configuration for the metrics HTTP surface.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Deployment identity attached to every gauge.
    pub const_labels: ConstLabels,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9300)),
            const_labels: ConstLabels::new(),
        }
    }
}

/// Top-level configuration for the exporter.
#[derive(Clone, Debug)]
pub struct ExporterConfig {
    pub node: NodeClientConfig,
    pub chain_status: ChainStatusConfig,
    pub metrics: MetricsConfig,
    /// Deadline for a whole scrape; upstream calls still outstanding after
    /// it are abandoned.
    pub scrape_timeout: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            node: NodeClientConfig::default(),
            chain_status: ChainStatusConfig::default(),
            metrics: MetricsConfig::default(),
            scrape_timeout: Duration::from_secs(10),
        }
    }
}

impl ExporterConfig {
    /// Checks invariants that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node.validate()?;
        if self.chain_status.sample_window <= 0 {
            return Err(ConfigError::NotPositive("sample window"));
        }
        if self.scrape_timeout.is_zero() {
            return Err(ConfigError::NotPositive("scrape timeout"));
        }
        Ok(())
    }
}
