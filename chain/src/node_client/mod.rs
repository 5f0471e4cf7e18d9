//! Query clients for the node's read-only surface.
//!
//! [`NodeQuery`] is the seam between the collectors and the transport: the
//! collectors only ever see domain types and a [`QueryError`], and tests
//! swap in in-memory fakes. [`HttpNodeClient`] is the concrete client that
//! talks to the node's REST gateway.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{BlockHeader, Proposal, UpgradePlan};

pub mod http;

pub use http::HttpNodeClient;

/// Errors that can occur while querying the node.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Transport-level error (connection refused, TLS, client timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// The node answered with a non-success status.
    #[error("node returned an error: {0}")]
    Service(String),
    /// The node returned a malformed or unexpected response.
    #[error("malformed response: {0}")]
    Protocol(String),
    /// The scrape deadline passed before the node answered.
    #[error("query abandoned after the scrape deadline")]
    DeadlineExceeded,
}

/// Read-only queries the exporter issues against a node.
///
/// Implementations must be safe to share between many in-flight scrapes;
/// none of these calls mutate client state observable by another request.
#[async_trait]
pub trait NodeQuery: Send + Sync {
    /// Most recent `limit` governance proposals, newest first.
    async fn proposals(&self, limit: u64) -> Result<Vec<Proposal>, QueryError>;

    /// Currently scheduled upgrade plan, if any.
    async fn current_plan(&self) -> Result<Option<UpgradePlan>, QueryError>;

    /// Header of the latest committed block.
    async fn latest_block(&self) -> Result<BlockHeader, QueryError>;

    /// Header of the block at `height`.
    async fn block_at(&self, height: i64) -> Result<BlockHeader, QueryError>;
}
