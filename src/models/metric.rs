// Telemetry models: raw series, reduced summaries, host configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl MetricSample {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// One metric's samples in chronological order; may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetricSeries {
    pub metric_name: String,
    pub samples: Vec<MetricSample>,
}

impl RawMetricSeries {
    pub fn new(metric_name: impl Into<String>, samples: Vec<MetricSample>) -> Self {
        Self {
            metric_name: metric_name.into(),
            samples,
        }
    }

    /// Convenience for `(timestamp_ms, value)` pairs.
    pub fn from_pairs(metric_name: impl Into<String>, pairs: &[(i64, f64)]) -> Self {
        Self::new(
            metric_name,
            pairs.iter().map(|&(t, v)| MetricSample::new(t, v)).collect(),
        )
    }
}

/// How a metric's raw values map to reported values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricScale {
    /// The API reports a 0..1 fraction; report it as 0..100.
    Percent,
    /// Rates and load averages, reported as-is.
    Raw,
}

impl MetricScale {
    pub fn factor(self) -> f64 {
        match self {
            MetricScale::Percent => 100.0,
            MetricScale::Raw => 1.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            MetricScale::Percent => "%",
            MetricScale::Raw => "",
        }
    }
}

/// min/max/average of one series, already scaled. `min <= average <= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetric {
    pub metric_name: String,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub sample_count: usize,
    pub scale: MetricScale,
}

/// Static host configuration as known to the monitoring backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    pub cpu_count: u32,
    pub memory_bytes: u64,
}

impl HostSnapshot {
    pub fn memory_mb(&self) -> u64 {
        self.memory_bytes / 1024 / 1024
    }
}
