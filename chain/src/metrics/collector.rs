//! The per-family collector contract.

use async_trait::async_trait;
use prometheus::Registry;
use thiserror::Error;

use crate::context::ScrapeContext;

/// Errors that abort a scrape.
///
/// Upstream failures never show up here: collectors absorb them and
/// degrade their output instead. What remains are defects in the exporter
/// itself.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to register {family} gauge: {source}")]
    Registration {
        family: &'static str,
        #[source]
        source: prometheus::Error,
    },
    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),
}

/// Produces a fully populated, request-scoped registry for one metric
/// family.
///
/// Implementations create a fresh [`Registry`] on every call, register
/// their gauges before issuing any query, and return the registry once
/// all upstream calls for the scrape are done.
#[async_trait]
pub trait Collector: Send + Sync {
    /// HTTP path the family is served on; also used in logs.
    fn endpoint(&self) -> &'static str;

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Registry, ScrapeError>;
}
