// Rate-limit cooldown gate
// Feature: Chart Chat Assistant (014-chart-chat)
//
// Client-side cooldown started only when the backend signals a rate limit;
// it never counts local send frequency. Each chat surface keys its own
// window by feature name.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::utils::time_format::format_countdown;

/// Default cooldown window when the backend gives no Retry-After
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Per-feature send cooldown gate
#[derive(Default)]
pub struct RateLimitGate {
    deadlines: Mutex<HashMap<String, Instant>>,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the cooldown for a feature
    pub fn trigger(&self, feature: &str, window_secs: u64) {
        let deadline = Instant::now() + Duration::from_secs(window_secs);
        let mut deadlines = self.deadlines.lock().unwrap_or_else(|e| e.into_inner());
        deadlines.insert(feature.to_string(), deadline);
        log::info!("[rate-limit] {} gated for {}s", feature, window_secs);
    }

    /// Whether sends for this feature are currently blocked
    pub fn is_limited(&self, feature: &str) -> bool {
        self.remaining_secs(feature) > 0
    }

    /// Seconds until the feature re-enables, rounded up; zero when open
    pub fn remaining_secs(&self, feature: &str) -> u64 {
        let now = Instant::now();
        let mut deadlines = self.deadlines.lock().unwrap_or_else(|e| e.into_inner());

        let Some(deadline) = deadlines.get(feature).copied() else {
            return 0;
        };
        if deadline <= now {
            deadlines.remove(feature);
            return 0;
        }

        let remaining = deadline.saturating_duration_since(now);
        let mut secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs += 1;
        }
        secs
    }

    /// Countdown display for the send affordance: `M:SS`, empty when open
    pub fn display(&self, feature: &str) -> String {
        format_countdown(self.remaining_secs(feature))
    }
}
