// chain/src/types/block.rs

//! Block header view used for chain velocity sampling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two header fields the exporter cares about.
///
/// Only height and time are needed to derive an average block time; the
/// rest of the header (proposer, app hash, ...) is ignored when decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Height of the block.
    pub height: i64,
    /// Block time as committed by the proposer.
    pub time: DateTime<Utc>,
}

impl BlockHeader {
    pub fn new(height: i64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }
}
