// Shared test helpers: in-memory build and telemetry sources

#![allow(dead_code)]

use std::sync::Mutex;

use buildscope::config::CorrelationConfig;
use buildscope::correlation::{BuildSource, MetricQuery, SnapshotQuery, TelemetrySource};
use buildscope::error::{CorrelationError, Result};
use buildscope::models::*;
use serde_json::{Map, Value, json};

/// 2021-05-03T00:00:00Z
pub const SCHEDULED_MS: i64 = 1_620_000_000_000;
pub const SCHEDULED_UNIX: i64 = 1_620_000_000;

pub const CONSOLE_LOG: &str = "Started by user admin\n\
[Pipeline] Start of Pipeline\n\
[Pipeline] node\n\
Running on agent-7 in /home/jenkins/workspace/envctl_main\n\
[Pipeline] {\n\
[Pipeline] End of Pipeline\n\
Finished: SUCCESS\n";

pub fn build_record(duration_ms: f64, execution_time_ms: Option<i64>) -> BuildRecord {
    BuildRecord {
        job_name: "ai-foundation/envctl/main".into(),
        build_id: 223,
        scheduled_timestamp_ms: SCHEDULED_MS,
        duration_ms,
        execution_time_ms,
        built_on: Some("agent-7".into()),
    }
}

pub struct FakeBuilds {
    pub record: Result<BuildRecord>,
    pub console_log: String,
    pub requested: Mutex<Vec<(JobPath, BuildSelector)>>,
    pub log_fetches: Mutex<u32>,
}

impl FakeBuilds {
    pub fn new(record: BuildRecord, console_log: &str) -> Self {
        Self {
            record: Ok(record),
            console_log: console_log.to_string(),
            requested: Mutex::new(Vec::new()),
            log_fetches: Mutex::new(0),
        }
    }

    pub fn failing(err: CorrelationError) -> Self {
        Self {
            record: Err(err),
            console_log: String::new(),
            requested: Mutex::new(Vec::new()),
            log_fetches: Mutex::new(0),
        }
    }
}

impl BuildSource for FakeBuilds {
    async fn fetch_build(&self, job: &JobPath, selector: BuildSelector) -> Result<BuildRecord> {
        self.requested.lock().unwrap().push((job.clone(), selector));
        self.record.clone()
    }

    async fn fetch_console_log(&self, _job: &JobPath, _build_id: u64) -> Result<String> {
        *self.log_fetches.lock().unwrap() += 1;
        Ok(self.console_log.clone())
    }
}

pub struct FakeTelemetry {
    pub series: Vec<RawMetricSeries>,
    pub snapshot_ids: Vec<String>,
    pub snapshot_data: Map<String, Value>,
    pub metric_queries: Mutex<Vec<MetricQuery>>,
    pub snapshot_queries: Mutex<Vec<SnapshotQuery>>,
}

impl FakeTelemetry {
    pub fn new(series: Vec<RawMetricSeries>) -> Self {
        Self {
            series,
            snapshot_ids: vec!["snap-1".into()],
            snapshot_data: host_config(8, 16 * 1024 * 1024 * 1024),
            metric_queries: Mutex::new(Vec::new()),
            snapshot_queries: Mutex::new(Vec::new()),
        }
    }
}

impl TelemetrySource for FakeTelemetry {
    async fn fetch_metrics(&self, query: &MetricQuery) -> Result<Vec<RawMetricSeries>> {
        self.metric_queries.lock().unwrap().push(query.clone());
        Ok(self.series.clone())
    }

    async fn search_snapshots(&self, query: &SnapshotQuery) -> Result<Vec<String>> {
        self.snapshot_queries.lock().unwrap().push(query.clone());
        Ok(self.snapshot_ids.clone())
    }

    async fn fetch_snapshot_data(
        &self,
        snapshot_id: &str,
        _window: &TimeWindow,
    ) -> Result<Map<String, Value>> {
        if self.snapshot_ids.iter().any(|id| id == snapshot_id) {
            Ok(self.snapshot_data.clone())
        } else {
            Err(CorrelationError::not_found("snapshot", snapshot_id))
        }
    }
}

pub fn host_config(cpus: u64, memory_bytes: u64) -> Map<String, Value> {
    let v = json!({
        "cpu.count": cpus,
        "memory.total": memory_bytes as f64,
        "os.name": "linux",
    });
    v.as_object().cloned().unwrap_or_default()
}

pub fn default_series() -> Vec<RawMetricSeries> {
    vec![
        RawMetricSeries::from_pairs("cpu.used", &[(0, 0.25), (1, 0.5), (2, 0.75)]),
        RawMetricSeries::from_pairs("load.1min", &[(0, 1.0), (1, 2.0), (2, 3.0)]),
        RawMetricSeries::from_pairs("memory.used", &[(0, 0.5), (1, 0.5)]),
    ]
}

pub fn correlation_config() -> CorrelationConfig {
    CorrelationConfig::default()
}
