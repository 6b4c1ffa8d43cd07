// Telemetry time window

use serde::{Deserialize, Serialize};

/// Interval of host telemetry to fetch. The duration is unsigned, so a
/// window can never be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_time_unix: i64,
    pub window_duration_ms: u64,
}

impl TimeWindow {
    pub fn new(start_time_unix: i64, window_duration_ms: u64) -> Self {
        Self {
            start_time_unix,
            window_duration_ms,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        self.window_duration_ms / 1000
    }

    /// End of the window in whole seconds.
    pub fn end_time_unix(&self) -> i64 {
        self.start_time_unix + self.duration_secs() as i64
    }

    /// End of the window in milliseconds, the unit the monitoring API expects for `to`.
    pub fn to_ms(&self) -> i64 {
        self.end_time_unix() * 1000
    }
}

/// Which part of the build the telemetry window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Execution start to completion; falls back to `Total` when execution time is unknown.
    #[default]
    Execution,
    /// Scheduling to completion, including time spent queued.
    Total,
}
