//! Prometheus-backed registration and rendering.
//!
//! Every scrape gets its own [`Registry`]; nothing registered here outlives
//! the request. This keeps the set of label combinations exactly equal to
//! what the node reported on this scrape, with no stale series from
//! proposals or plans that have since disappeared.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use super::ScrapeError;
use crate::config::ConstLabels;

/// Rendered exposition body plus the content type to serve it with.
#[derive(Clone, Debug)]
pub struct Exposition {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Exposition {
    /// Body as text; the text encoder only ever produces UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Creates a labelled gauge family and registers it into `registry`.
///
/// Fails when the family clashes with one already registered or when a
/// label name is invalid; both are programming errors, never runtime
/// conditions of the node.
pub fn register_gauge_vec(
    registry: &Registry,
    name: &'static str,
    help: &'static str,
    labels: &[&str],
    const_labels: &ConstLabels,
) -> Result<GaugeVec, ScrapeError> {
    let registration = |source: prometheus::Error| ScrapeError::Registration {
        family: name,
        source,
    };

    let opts = Opts::new(name, help).const_labels(const_labels.to_map());
    let gauge = GaugeVec::new(opts, labels).map_err(registration)?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(registration)?;
    Ok(gauge)
}

/// Encodes everything in `registry` into the Prometheus text format.
///
/// Pure with respect to the registry: it is only gathered, never touched.
pub fn render(registry: &Registry) -> Result<Exposition, ScrapeError> {
    let metric_families = registry.gather();
    let encoder = TextEncoder::new();
    let mut body = Vec::new();
    encoder
        .encode(&metric_families, &mut body)
        .map_err(ScrapeError::Encode)?;

    Ok(Exposition {
        content_type: encoder.format_type().to_string(),
        body,
    })
}
