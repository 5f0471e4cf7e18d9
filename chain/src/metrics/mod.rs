//! Per-scrape metric collection.
//!
//! Each metric family has a [`Collector`] that builds a fresh Prometheus
//! registry for every scrape, queries the node (through a [`FanOut`] task
//! group bounded by the scrape deadline), and populates gauges from what
//! came back. [`render`] then turns the registry into the text exposition
//! format.
//!
//! Typical usage from an HTTP handler:
//!
//! ```ignore
//! use std::time::Duration;
//! use chain::{Collector, ScrapeContext, render};
//!
//! let ctx = ScrapeContext::new(collector.endpoint(), Duration::from_secs(10));
//! let registry = collector.collect(&ctx).await?;
//! let exposition = render(&registry)?;
//! ```
//!
//! Upstream failures are absorbed by the collectors and only show up as
//! missing or placeholder samples; the only errors surfaced to the caller
//! are registration and encoding defects ([`ScrapeError`]).

pub mod collector;
pub mod fanout;
pub mod prometheus;
pub mod proposals;
pub mod upgrade;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{Collector, ScrapeError};
pub use fanout::{FanOut, FanOutError, TaskOutcome};
pub use self::prometheus::{Exposition, register_gauge_vec, render};
pub use proposals::{PROPOSAL_LABELS, PROPOSALS_METRIC, PROPOSALS_PAGE_LIMIT, ProposalsCollector};
pub use upgrade::{
    ABSENT_PLACEHOLDER, PlanObservation, UPGRADE_PLAN_LABELS, UPGRADE_PLAN_METRIC, UpgradeCollector,
};
