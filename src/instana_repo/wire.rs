// Instana infrastructure-monitoring payloads

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimeFrame {
    pub to: i64,
    pub window_size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CombinedMetricsRequest<'a> {
    pub metrics: &'a [String],
    pub plugin: &'a str,
    pub query: &'a str,
    pub time_frame: TimeFrame,
    pub rollup: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetricsResponse {
    #[serde(default)]
    pub items: Vec<MetricItem>,
}

/// Points are `[timestampMs, value]`; the value may be null for gaps.
#[derive(Debug, Deserialize)]
pub(crate) struct MetricItem {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Vec<(f64, Option<f64>)>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotsResponse {
    #[serde(default)]
    pub items: Vec<SnapshotItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SnapshotItem {
    pub snapshot_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotResponse {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}
