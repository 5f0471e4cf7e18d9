//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use chain::{
    ChainStatusProvider, ConstLabels, ExporterConfig, NodeChainStatus, NodeQuery,
    ProposalsCollector, UpgradeCollector,
};

/// State shared by every request handler.
///
/// Only long-lived, read-only pieces live here: the collectors (which hold
/// the shared node client) and the scrape deadline. Registries are never
/// stored here; each scrape builds its own.
pub struct AppState {
    pub proposals: ProposalsCollector,
    pub upgrade: UpgradeCollector,
    pub scrape_timeout: Duration,
}

impl AppState {
    /// Wires collectors around an existing node client and chain status
    /// provider.
    pub fn new(
        client: Arc<dyn NodeQuery>,
        chain_status: Arc<dyn ChainStatusProvider>,
        const_labels: ConstLabels,
        scrape_timeout: Duration,
    ) -> Self {
        let const_labels = Arc::new(const_labels);
        Self {
            proposals: ProposalsCollector::new(Arc::clone(&client), Arc::clone(&const_labels)),
            upgrade: UpgradeCollector::new(client, chain_status, const_labels),
            scrape_timeout,
        }
    }

    /// Builds the production state: chain status is sampled from the same
    /// node the collectors query.
    pub fn from_config(cfg: &ExporterConfig, client: Arc<dyn NodeQuery>) -> Self {
        let chain_status = Arc::new(NodeChainStatus::new(
            Arc::clone(&client),
            &cfg.chain_status,
        ));
        Self::new(
            client,
            chain_status,
            cfg.metrics.const_labels.clone(),
            cfg.scrape_timeout,
        )
    }
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
