//! Chain status snapshots and block time estimation.
//!
//! The upgrade collector needs two things from the chain: the current
//! height, and a projection of when a height `delta` blocks ahead will be
//! reached. [`ChainStatusProvider`] hands out a fresh [`ChainStatus`]
//! snapshot per scrape; nothing is cached between scrapes.
//!
//! [`NodeChainStatus`] derives block velocity from two headers
//! `sample_window` blocks apart:
//!
//! ```text
//! block_time = (latest.time - earlier.time) / (latest.height - earlier.height)
//! eta(delta) = latest.time + block_time * delta
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ChainStatusConfig;
use crate::node_client::{NodeQuery, QueryError};
use crate::types::BlockHeader;

/// Errors returned by [`ChainStatus::estimate_time_to_height`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    /// Not enough block history was available to derive a block time.
    #[error("not enough block history to estimate block time")]
    InsufficientHistory,
    /// Estimation only makes sense for heights in the future.
    #[error("height delta must be positive, got {0}")]
    InvalidDelta(i64),
    /// The projection does not fit into a timestamp.
    #[error("estimated time for {0} blocks is out of range")]
    OutOfRange(i64),
}

/// Point-in-time view of the chain.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainStatus {
    latest_height: i64,
    latest_time: DateTime<Utc>,
    block_time: Option<Duration>,
}

impl ChainStatus {
    /// Snapshot with no velocity information; estimates will fail.
    pub fn new(latest_height: i64, latest_time: DateTime<Utc>) -> Self {
        Self {
            latest_height,
            latest_time,
            block_time: None,
        }
    }

    pub fn with_block_time(mut self, block_time: Duration) -> Self {
        self.block_time = Some(block_time);
        self
    }

    /// Builds a snapshot from the latest header and an older sample.
    ///
    /// Velocity is left unknown when the sample is not strictly older in
    /// both height and time.
    pub fn from_samples(latest: &BlockHeader, earlier: &BlockHeader) -> Self {
        let status = Self::new(latest.height, latest.time);

        let blocks = latest.height - earlier.height;
        let elapsed = (latest.time - earlier.time).to_std().ok();
        match elapsed {
            Some(elapsed) if blocks > 0 && !elapsed.is_zero() => {
                let per_block = elapsed.as_secs_f64() / blocks as f64;
                status.with_block_time(Duration::from_secs_f64(per_block))
            }
            _ => status,
        }
    }

    /// Current best-known block height.
    pub fn latest_height(&self) -> i64 {
        self.latest_height
    }

    pub fn latest_time(&self) -> DateTime<Utc> {
        self.latest_time
    }

    /// Average block time derived from recent history, if known.
    pub fn block_time(&self) -> Option<Duration> {
        self.block_time
    }

    /// Projects the wall-clock arrival time of the block `delta` blocks
    /// past the latest one.
    pub fn estimate_time_to_height(&self, delta: i64) -> Result<DateTime<Utc>, EstimateError> {
        if delta <= 0 {
            return Err(EstimateError::InvalidDelta(delta));
        }
        let block_time = self.block_time.ok_or(EstimateError::InsufficientHistory)?;

        let ahead = Duration::try_from_secs_f64(block_time.as_secs_f64() * delta as f64)
            .map_err(|_| EstimateError::OutOfRange(delta))?;
        let ahead = TimeDelta::from_std(ahead).map_err(|_| EstimateError::OutOfRange(delta))?;

        self.latest_time
            .checked_add_signed(ahead)
            .ok_or(EstimateError::OutOfRange(delta))
    }
}

/// Source of fresh [`ChainStatus`] snapshots.
#[async_trait]
pub trait ChainStatusProvider: Send + Sync {
    async fn status(&self) -> Result<ChainStatus, QueryError>;
}

/// [`ChainStatusProvider`] backed by block headers fetched from the node.
pub struct NodeChainStatus {
    client: Arc<dyn NodeQuery>,
    sample_window: i64,
}

impl NodeChainStatus {
    pub fn new(client: Arc<dyn NodeQuery>, cfg: &ChainStatusConfig) -> Self {
        Self {
            client,
            sample_window: cfg.sample_window.max(1),
        }
    }
}

#[async_trait]
impl ChainStatusProvider for NodeChainStatus {
    async fn status(&self) -> Result<ChainStatus, QueryError> {
        let latest = self.client.latest_block().await?;

        let sample_height = latest.height - self.sample_window;
        if sample_height < 1 {
            debug!(
                latest_height = latest.height,
                sample_window = self.sample_window,
                "chain shorter than sample window, block time unknown"
            );
            return Ok(ChainStatus::new(latest.height, latest.time));
        }

        // The height is what callers need most; a failed velocity sample
        // only costs the estimate.
        match self.client.block_at(sample_height).await {
            Ok(earlier) => Ok(ChainStatus::from_samples(&latest, &earlier)),
            Err(err) => {
                warn!(height = sample_height, error = %err, "could not sample block for block time");
                Ok(ChainStatus::new(latest.height, latest.time))
            }
        }
    }
}
