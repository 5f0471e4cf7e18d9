//! Upgrade plan collector.
//!
//! Emits a single `cosmos_upgrade_plan` gauge whose value is the number of
//! blocks left until the scheduled upgrade height. Three outcomes are
//! distinguishable on the wire:
//!
//! - plan pending: labels from the plan, value = blocks remaining;
//! - nothing pending (no plan, or plan at/below the current height): the
//!   absence sentinel, `info="None"`, `name="None"`, value 0;
//! - query failed: no sample at all.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prometheus::{GaugeVec, Registry};
use tracing::{debug, error};

use super::fanout::FanOut;
use super::prometheus::register_gauge_vec;
use super::{Collector, ScrapeError};
use crate::chain_status::ChainStatusProvider;
use crate::config::ConstLabels;
use crate::context::ScrapeContext;
use crate::node_client::NodeQuery;
use crate::types::{UpgradePlan, format_optional_label_time, format_rfc1123};

pub const UPGRADE_PLAN_METRIC: &str = "cosmos_upgrade_plan";
pub const UPGRADE_PLAN_LABELS: [&str; 5] = ["info", "name", "time", "height", "estimated_time"];

/// Placeholder used for `info` and `name` when no upgrade is pending.
pub const ABSENT_PLACEHOLDER: &str = "None";

/// What the collector observed about the upgrade plan on this scrape.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanObservation {
    /// Queried successfully, nothing actionable scheduled.
    Absent,
    Pending {
        plan: UpgradePlan,
        remaining: i64,
        /// `None` when the chain status could not project an arrival time.
        estimated_time: Option<DateTime<Utc>>,
    },
}

impl PlanObservation {
    fn label_values(&self) -> [String; 5] {
        match self {
            Self::Absent => [
                ABSENT_PLACEHOLDER.to_string(),
                ABSENT_PLACEHOLDER.to_string(),
                String::new(),
                String::new(),
                String::new(),
            ],
            Self::Pending {
                plan,
                estimated_time,
                ..
            } => [
                plan.info.clone(),
                plan.name.clone(),
                format_optional_label_time(plan.time.as_ref()),
                plan.height.to_string(),
                estimated_time.as_ref().map(format_rfc1123).unwrap_or_default(),
            ],
        }
    }

    fn value(&self) -> f64 {
        match self {
            Self::Absent => 0.0,
            Self::Pending { remaining, .. } => *remaining as f64,
        }
    }

    fn record(&self, gauge: &GaugeVec) {
        let values = self.label_values();
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        gauge.with_label_values(&values).set(self.value());
    }
}

pub struct UpgradeCollector {
    client: Arc<dyn NodeQuery>,
    chain_status: Arc<dyn ChainStatusProvider>,
    const_labels: Arc<ConstLabels>,
}

impl UpgradeCollector {
    pub fn new(
        client: Arc<dyn NodeQuery>,
        chain_status: Arc<dyn ChainStatusProvider>,
        const_labels: Arc<ConstLabels>,
    ) -> Self {
        Self {
            client,
            chain_status,
            const_labels,
        }
    }

    /// Resolves a successfully fetched plan against the current chain
    /// status. Returns `None` when the status itself is unavailable, in
    /// which case nothing is emitted.
    async fn observe(
        &self,
        ctx: &ScrapeContext,
        plan: Option<UpgradePlan>,
    ) -> Option<PlanObservation> {
        let Some(plan) = plan else {
            return Some(PlanObservation::Absent);
        };

        let status = match ctx.bounded(self.chain_status.status()).await {
            Ok(status) => status,
            Err(err) => {
                error!(parent: ctx.span(), error = %err, "could not get sync info");
                return None;
            }
        };

        let remaining = plan.remaining_blocks(status.latest_height());
        if remaining <= 0 {
            debug!(
                parent: ctx.span(),
                plan_height = plan.height,
                latest_height = status.latest_height(),
                "upgrade height already reached"
            );
            return Some(PlanObservation::Absent);
        }

        let estimated_time = match status.estimate_time_to_height(remaining) {
            Ok(eta) => Some(eta),
            Err(err) => {
                error!(parent: ctx.span(), remaining, error = %err, "could not get estimated time");
                None
            }
        };

        Some(PlanObservation::Pending {
            plan,
            remaining,
            estimated_time,
        })
    }
}

#[async_trait]
impl Collector for UpgradeCollector {
    fn endpoint(&self) -> &'static str {
        "/metrics/upgrade"
    }

    async fn collect(&self, ctx: &ScrapeContext) -> Result<Registry, ScrapeError> {
        let registry = Registry::new();
        let gauge = register_gauge_vec(
            &registry,
            UPGRADE_PLAN_METRIC,
            "Upgrade plan info in height",
            &UPGRADE_PLAN_LABELS,
            &self.const_labels,
        )?;

        let mut fan_out = FanOut::new(ctx);
        let client = Arc::clone(&self.client);
        fan_out.spawn("current_plan", async move {
            let query_start = Instant::now();
            let plan = client.current_plan().await?;
            debug!(
                request_time = query_start.elapsed().as_secs_f64(),
                "finished querying upgrade plan"
            );
            Ok(plan)
        });

        let mut fetched = None;
        for outcome in fan_out.join_all().await {
            match outcome.result {
                Ok(plan) => fetched = Some(plan),
                Err(err) => {
                    error!(parent: ctx.span(), query = outcome.name, error = %err, "could not get upgrade plan");
                }
            }
        }

        if let Some(plan) = fetched {
            if let Some(observation) = self.observe(ctx, plan).await {
                observation.record(&gauge);
            }
        }

        Ok(registry)
    }
}
