//! Correlation engine: ties one CI build to its host's telemetry.
//!
//! A run is strictly ordered: resolve job path, fetch build metadata, identify
//! the host, derive the window, select a rollup, fetch and aggregate metrics,
//! then resolve the host snapshot. Any failure aborts the run; there is no
//! partial report.

pub mod aggregation;
pub mod host;
pub mod job_path;
pub mod rollup;
pub mod snapshot;
pub mod window;

use std::future::Future;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::config::CorrelationConfig;
use crate::error::Result;
use crate::models::{
    BuildInfo, BuildRecord, BuildSelector, CorrelationReport, JobPath, RawMetricSeries,
    TimeWindow,
};
use host::HostIdentifier;

/// Entity filter selecting a host by name in the monitoring backend.
pub fn host_filter(host: &str) -> String {
    format!("entity.host.name:{}", host)
}

/// Time-series query for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub filter: String,
    pub metrics: Vec<String>,
    /// Window end in milliseconds.
    pub to_ms: i64,
    pub window_size_ms: u64,
    pub rollup_secs: u32,
}

impl MetricQuery {
    pub fn for_host(host: &str, metrics: &[String], window: &TimeWindow, rollup_secs: u32) -> Self {
        Self {
            filter: host_filter(host),
            metrics: metrics.to_vec(),
            to_ms: window.to_ms(),
            window_size_ms: window.window_duration_ms,
            rollup_secs,
        }
    }
}

/// Snapshot search for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    pub filter: String,
    /// Window end in milliseconds.
    pub to_ms: i64,
    pub window_size_ms: u64,
}

impl SnapshotQuery {
    pub fn for_host(host: &str, window: &TimeWindow) -> Self {
        Self {
            filter: host_filter(host),
            to_ms: window.to_ms(),
            window_size_ms: window.window_duration_ms,
        }
    }
}

/// CI build-metadata service.
pub trait BuildSource {
    fn fetch_build(
        &self,
        job: &JobPath,
        selector: BuildSelector,
    ) -> impl Future<Output = Result<BuildRecord>> + Send;

    fn fetch_console_log(
        &self,
        job: &JobPath,
        build_id: u64,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Monitoring/telemetry service.
pub trait TelemetrySource {
    fn fetch_metrics(
        &self,
        query: &MetricQuery,
    ) -> impl Future<Output = Result<Vec<RawMetricSeries>>> + Send;

    /// Snapshot ids matching the query, in the backend's order.
    fn search_snapshots(
        &self,
        query: &SnapshotQuery,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn fetch_snapshot_data(
        &self,
        snapshot_id: &str,
        window: &TimeWindow,
    ) -> impl Future<Output = Result<Map<String, Value>>> + Send;
}

/// Resolves the job path, fetches the build and derives its timing and host.
/// Build id 0 means the most recent successful build.
#[instrument(skip(builds, host_identifier), fields(operation = "build_info"))]
pub async fn fetch_build_info<B: BuildSource>(
    builds: &B,
    host_identifier: &dyn HostIdentifier,
    job_path: &str,
    build_id: u64,
) -> Result<BuildInfo> {
    let job = job_path::resolve_job_path(job_path);
    let selector = BuildSelector::from_id(build_id);
    info!(job = %job.leaf_name, parents = ?job.parent_segments, %selector, "retrieving build");

    let record = builds.fetch_build(&job, selector).await?;
    let console_log = if host_identifier.needs_console_log() {
        builds.fetch_console_log(&job, record.build_id).await?
    } else {
        String::new()
    };
    let host = host_identifier.identify(&record, &console_log)?;
    debug!(build_id = record.build_id, %host, "build host identified");

    window::derive_build_info(&record, host)
}

/// Runs correlations against a build source and a telemetry source.
pub struct Correlator<B, T> {
    builds: B,
    telemetry: T,
    host_identifier: Box<dyn HostIdentifier>,
    config: CorrelationConfig,
}

impl<B: BuildSource, T: TelemetrySource> Correlator<B, T> {
    pub fn new(builds: B, telemetry: T, config: CorrelationConfig) -> Self {
        let host_identifier = config
            .host_source
            .identifier(config.host_match_case_sensitive);
        Self {
            builds,
            telemetry,
            host_identifier,
            config,
        }
    }

    /// Replaces the configured host identification strategy.
    pub fn with_host_identifier(mut self, host_identifier: Box<dyn HostIdentifier>) -> Self {
        self.host_identifier = host_identifier;
        self
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Fetches a build and derives its timing and host. Build id 0 means the
    /// most recent successful build.
    pub async fn build_info(&self, job_path: &str, build_id: u64) -> Result<BuildInfo> {
        fetch_build_info(&self.builds, self.host_identifier.as_ref(), job_path, build_id).await
    }

    pub async fn correlate(&self, job_path: &str, build_id: u64) -> Result<CorrelationReport> {
        self.correlate_at(job_path, build_id, chrono::Utc::now().timestamp())
            .await
    }

    /// Same as `correlate`, with "now" supplied for rollup selection.
    pub async fn correlate_at(
        &self,
        job_path: &str,
        build_id: u64,
        now_unix: i64,
    ) -> Result<CorrelationReport> {
        let build = self.build_info(job_path, build_id).await?;
        let (window_kind, window) = window::telemetry_window(&build, self.config.window)?;
        let rollup_secs = rollup::select_rollup(&window, self.config.max_data_points, now_unix);
        info!(
            host = %build.agent_host_machine,
            start = window.start_time_unix,
            window_ms = window.window_duration_ms,
            rollup_secs,
            "fetching host metrics"
        );

        let query = MetricQuery::for_host(
            &build.agent_host_machine,
            &self.config.metrics,
            &window,
            rollup_secs,
        );
        let series = self.telemetry.fetch_metrics(&query).await?;
        let metrics = aggregation::aggregate_requested(&self.config.metrics, &series)?;

        let host = snapshot::resolve_host_snapshot(
            &self.telemetry,
            &build.agent_host_machine,
            &window,
            self.config.snapshot_selection,
        )
        .await?;

        Ok(CorrelationReport {
            build,
            window_kind,
            window,
            rollup_secs,
            metrics,
            host,
        })
    }
}
