//! Per-session inference telemetry. Counters only move forward; the sole
//! mutation path is `record`, called after a generation call completes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Default, Debug, Clone)]
pub struct SessionStats {
    total_time: Duration,
    count: u64,
    last_time: Duration,
}

impl SessionStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed generation call into the counters.
    pub fn record(&mut self, duration: Duration) {
        self.total_time += duration;
        self.count += 1;
        self.last_time = duration;
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    #[inline]
    pub fn last_time(&self) -> Duration {
        self.last_time
    }

    /// Millisecond view handed across the binding layer.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_inference_time: self.total_time.as_millis() as u64,
            inference_count: self.count,
            last_inference_time: self.last_time.as_millis() as u64,
        }
    }
}

/// Serializable counters, durations in milliseconds.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_inference_time: u64,
    pub inference_count: u64,
    pub last_inference_time: u64,
}
