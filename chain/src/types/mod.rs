//! Core domain types read from the node.
//!
//! Everything in here is a read-only view of upstream state, fetched for
//! the duration of a single scrape and mapped into gauge observations.
//! Wire DTOs live next to the client that decodes them; these types are
//! what the collectors see.

use chrono::{DateTime, Utc};

pub mod block;
pub mod proposal;
pub mod upgrade;

pub use block::BlockHeader;
pub use proposal::{Proposal, ProposalStatus};
pub use upgrade::UpgradePlan;

/// Formats a timestamp the way the node's Go tooling prints `time.Time`
/// values, e.g. `2024-05-01 12:00:00.5 +0000 UTC`.
///
/// Existing dashboards match on these label values, so the format is kept
/// stable. Fractional seconds are printed without trailing zeros and
/// omitted entirely when zero.
pub fn format_label_time(ts: &DateTime<Utc>) -> String {
    let mut fraction = ts.format("%.9f").to_string();
    while fraction.ends_with('0') {
        fraction.pop();
    }
    if fraction == "." {
        fraction.clear();
    }
    format!("{}{fraction} +0000 UTC", ts.format("%Y-%m-%d %H:%M:%S"))
}

/// Same as [`format_label_time`] but maps a missing timestamp to `""`.
pub fn format_optional_label_time(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(format_label_time).unwrap_or_default()
}

/// Formats an estimated arrival time as RFC 1123 in UTC, e.g.
/// `Wed, 01 May 2024 12:00:00 UTC`.
pub fn format_rfc1123(ts: &DateTime<Utc>) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S UTC").to_string()
}
