//! Software upgrade plan scheduled through governance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled protocol upgrade at a future block height.
///
/// `time` is deprecated on the chain side and usually carries the zero
/// timestamp; it is still exported because dashboards key on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePlan {
    pub name: String,
    /// Free-form metadata, typically a JSON blob with binary URLs.
    pub info: String,
    pub time: Option<DateTime<Utc>>,
    /// Height at which the chain halts for the upgrade.
    pub height: i64,
}

impl UpgradePlan {
    /// Blocks remaining between `current_height` and the upgrade height.
    ///
    /// Zero or negative means the plan is not actionable any more.
    pub fn remaining_blocks(&self, current_height: i64) -> i64 {
        self.height.saturating_sub(current_height)
    }
}
