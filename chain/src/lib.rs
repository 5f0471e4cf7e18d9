//! Chain library crate.
//!
//! This crate provides the building blocks of an on-demand metrics
//! exporter for Cosmos-based chains, where every scrape queries the node
//! live:
//!
//! - read-only domain types for proposals, upgrade plans and blocks
//!   (`types`),
//! - a query client for the node's REST gateway (`node_client`),
//! - chain status snapshots and block time estimation (`chain_status`),
//! - the per-scrape request context (`context`),
//! - collectors, fan-out and Prometheus rendering (`metrics`),
//! - and a top-level exporter configuration (`config`).
//!
//! The HTTP surface lives in the `exporter` crate; everything here can be
//! driven without a server, which is how the collectors are tested.

pub mod chain_status;
pub mod config;
pub mod context;
pub mod metrics;
pub mod node_client;
pub mod types;

// Re-export top-level configuration types.
pub use config::{
    ChainStatusConfig, ConfigError, ConstLabels, ExporterConfig, MetricsConfig, NodeClientConfig,
};

pub use chain_status::{ChainStatus, ChainStatusProvider, EstimateError, NodeChainStatus};
pub use context::ScrapeContext;

// Re-export node query interfaces and the HTTP client.
pub use node_client::{HttpNodeClient, NodeQuery, QueryError};

// Re-export collectors and rendering.
pub use metrics::{
    Collector, Exposition, FanOut, FanOutError, ProposalsCollector, ScrapeError, TaskOutcome,
    UpgradeCollector, render,
};

// Re-export domain types at the crate root for convenience.
pub use types::*;
