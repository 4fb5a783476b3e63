// Chat usage/quota models

use serde::{Deserialize, Serialize};

fn default_limit() -> u32 {
    50
}

/// Snapshot of the user's chat quota, persisted locally and refreshed
/// whenever the backend reports usage alongside a reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    #[serde(default)]
    pub used: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self {
            used: 0,
            limit: default_limit(),
        }
    }
}

impl UsageSnapshot {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }

    pub fn exhausted(&self) -> bool {
        self.used >= self.limit
    }
}
