//! Governance proposals collector.
//!
//! Emits one `cosmos_proposals` gauge per proposal among the most recent
//! [`PROPOSALS_PAGE_LIMIT`]. The gauge value is the proposal id: dashboards
//! built against the existing exporter read the id from the sample value,
//! so it is kept that way rather than moved into a label.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use prometheus::Registry;
use tracing::{debug, error};

use super::fanout::FanOut;
use super::prometheus::register_gauge_vec;
use super::{Collector, ScrapeError};
use crate::config::ConstLabels;
use crate::context::ScrapeContext;
use crate::node_client::NodeQuery;
use crate::types::{Proposal, format_optional_label_time};

/// Number of proposals requested per scrape, newest first.
pub const PROPOSALS_PAGE_LIMIT: u64 = 20;

pub const PROPOSALS_METRIC: &str = "cosmos_proposals";
pub const PROPOSAL_LABELS: [&str; 4] = ["title", "status", "voting_start_time", "voting_end_time"];

pub struct ProposalsCollector {
    client: Arc<dyn NodeQuery>,
    const_labels: Arc<ConstLabels>,
    limit: u64,
}

impl ProposalsCollector {
    pub fn new(client: Arc<dyn NodeQuery>, const_labels: Arc<ConstLabels>) -> Self {
        Self {
            client,
            const_labels,
            limit: PROPOSALS_PAGE_LIMIT,
        }
    }
}

fn label_values(proposal: &Proposal) -> [String; 4] {
    [
        proposal.title.clone(),
        proposal.status.to_string(),
        format_optional_label_time(proposal.voting_start_time.as_ref()),
        format_optional_label_time(proposal.voting_end_time.as_ref()),
    ]
}

#[async_trait]
impl Collector for ProposalsCollector {
    fn endpoint(&self) -> &'static str {
        "/metrics/proposals"
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Registry, ScrapeError> {
        let registry = Registry::new();
        let gauge = register_gauge_vec(
            &registry,
            PROPOSALS_METRIC,
            "Proposals of Cosmos-based blockchain",
            &PROPOSAL_LABELS,
            &self.const_labels,
        )?;

        let mut fan_out = FanOut::new(ctx);
        let client = Arc::clone(&self.client);
        let limit = self.limit;
        fan_out.spawn("proposals", async move {
            debug!("started querying proposals");
            let query_start = Instant::now();
            let page = client.proposals(limit).await?;
            debug!(
                request_time = query_start.elapsed().as_secs_f64(),
                "finished querying proposals"
            );
            Ok(page)
        });

        let mut proposals = Vec::new();
        for outcome in fan_out.join_all().await {
            match outcome.result {
                Ok(page) => proposals.extend(page),
                Err(err) => {
                    error!(parent: ctx.span(), query = outcome.name, error = %err, "could not get proposals");
                }
            }
        }

        debug!(parent: ctx.span(), proposals = proposals.len(), "proposals info");

        for proposal in proposals.iter().take(self.limit as usize) {
            let values = label_values(proposal);
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            gauge.with_label_values(&values).set(proposal.id as f64);
        }

        Ok(registry)
    }
}
