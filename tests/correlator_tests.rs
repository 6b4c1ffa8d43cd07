// End-to-end correlation runs against in-memory sources

mod common;

use buildscope::correlation::host::{BuiltOnHostIdentifier, LogHostIdentifier};
use buildscope::correlation::snapshot::SnapshotSelection;
use buildscope::correlation::{Correlator, MetricQuery, fetch_build_info};
use buildscope::error::CorrelationError;
use buildscope::models::{BuildSelector, MetricScale, RawMetricSeries, TimeWindow, WindowKind};
use common::*;

const NOW: i64 = SCHEDULED_UNIX + 3_600;

#[tokio::test]
async fn full_report_for_recent_build() {
    let builds = FakeBuilds::new(build_record(125_000.0, Some(90_000)), CONSOLE_LOG);
    let telemetry = FakeTelemetry::new(default_series());
    let correlator = Correlator::new(builds, telemetry, correlation_config());

    let report = correlator
        .correlate_at("job/ai-foundation/job/envctl/job/main/", 223, NOW)
        .await
        .unwrap();

    assert_eq!(report.build.agent_host_machine, "agent-7");
    assert_eq!(report.window_kind, WindowKind::Execution);
    assert_eq!(report.window.start_time_unix, SCHEDULED_UNIX + 35);
    assert_eq!(report.window.window_duration_ms, 90_000);
    assert_eq!(report.rollup_secs, 1);
    assert_eq!(report.host.cpu_count, 8);

    let names: Vec<_> = report.metrics.iter().map(|m| m.metric_name.as_str()).collect();
    assert_eq!(names, vec!["cpu.used", "load.1min", "memory.used"]);
    assert_eq!(report.metrics[0].average, 50.0);
    assert_eq!(report.metrics[0].scale, MetricScale::Percent);
    assert_eq!(report.metrics[1].max, 3.0);
}

#[tokio::test]
async fn job_path_and_build_id_reach_the_build_source() {
    let builds = FakeBuilds::new(build_record(10_000.0, None), CONSOLE_LOG);
    let host = LogHostIdentifier::default();
    fetch_build_info(&builds, &host, "job/a/job/b/job/c/", 0)
        .await
        .unwrap();
    fetch_build_info(&builds, &host, "job/a/job/b/job/c/", 17)
        .await
        .unwrap();

    let requested = builds.requested.lock().unwrap();
    assert_eq!(requested[0].0.leaf_name, "c");
    assert_eq!(requested[0].0.parent_segments, vec!["a", "b"]);
    assert_eq!(requested[0].1, BuildSelector::LastSuccessful);
    assert_eq!(requested[1].1, BuildSelector::Number(17));
}

#[tokio::test]
async fn one_hour_build_uses_one_minute_rollup() {
    let builds = FakeBuilds::new(build_record(3_600_000.0, None), CONSOLE_LOG);
    let telemetry = FakeTelemetry::new(default_series());
    let correlator = Correlator::new(builds, telemetry, correlation_config());

    let report = correlator.correlate_at("job/x", 5, NOW).await.unwrap();
    assert_eq!(report.window_kind, WindowKind::Total);
    assert_eq!(report.rollup_secs, 60);
}

#[tokio::test]
async fn old_build_uses_minute_granularity() {
    let builds = FakeBuilds::new(build_record(120_000.0, Some(100_000)), CONSOLE_LOG);
    let telemetry = FakeTelemetry::new(default_series());
    let correlator = Correlator::new(builds, telemetry, correlation_config());

    let report = correlator
        .correlate_at("job/x", 5, SCHEDULED_UNIX + 3 * 86_400)
        .await
        .unwrap();
    assert_eq!(report.rollup_secs, 60);
}

#[tokio::test]
async fn missing_host_line_aborts_the_run() {
    let builds = FakeBuilds::new(build_record(10_000.0, None), "Finished: SUCCESS\n");
    let telemetry = FakeTelemetry::new(default_series());
    let correlator = Correlator::new(builds, telemetry, correlation_config());

    let err = correlator.correlate_at("job/x", 1, NOW).await.unwrap_err();
    assert!(matches!(err, CorrelationError::NotFound { ref what, .. } if what == "build host"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn upstream_failure_propagates() {
    let builds = FakeBuilds::failing(CorrelationError::upstream("jenkins", "connection refused"));
    let telemetry = FakeTelemetry::new(default_series());
    let correlator = Correlator::new(builds, telemetry, correlation_config());

    let err = correlator.correlate_at("job/x", 1, NOW).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn empty_metric_series_means_no_report() {
    let builds = FakeBuilds::new(build_record(10_000.0, None), CONSOLE_LOG);
    let telemetry = FakeTelemetry::new(vec![
        RawMetricSeries::from_pairs("cpu.used", &[(0, 0.1)]),
        RawMetricSeries::new("load.1min", vec![]),
        RawMetricSeries::from_pairs("memory.used", &[(0, 0.1)]),
    ]);
    let correlator = Correlator::new(builds, telemetry, correlation_config());

    let err = correlator.correlate_at("job/x", 1, NOW).await.unwrap_err();
    assert_eq!(
        err,
        CorrelationError::EmptySeries {
            metric: "load.1min".into()
        }
    );
}

#[tokio::test]
async fn unique_snapshot_policy_rejects_several_matches() {
    let builds = FakeBuilds::new(build_record(10_000.0, None), CONSOLE_LOG);
    let mut telemetry = FakeTelemetry::new(default_series());
    telemetry.snapshot_ids = vec!["s1".into(), "s2".into()];
    let mut config = correlation_config();
    config.snapshot_selection = SnapshotSelection::Unique;
    let correlator = Correlator::new(builds, telemetry, config);

    let err = correlator.correlate_at("job/x", 1, NOW).await.unwrap_err();
    assert!(matches!(err, CorrelationError::Ambiguous { count: 2, .. }));
}

#[tokio::test]
async fn metadata_host_identifier_skips_console_log() {
    let builds = FakeBuilds::new(build_record(10_000.0, None), "");
    let telemetry = FakeTelemetry::new(default_series());
    let correlator = Correlator::new(builds, telemetry, correlation_config())
        .with_host_identifier(Box::new(BuiltOnHostIdentifier));

    let info = correlator.build_info("job/x", 1).await.unwrap();
    assert_eq!(info.agent_host_machine, "agent-7");
}

#[tokio::test]
async fn log_identifier_fetches_console_log_once() {
    let builds = FakeBuilds::new(build_record(10_000.0, None), CONSOLE_LOG);
    let host = LogHostIdentifier::default();
    fetch_build_info(&builds, &host, "job/x", 1).await.unwrap();
    assert_eq!(*builds.log_fetches.lock().unwrap(), 1);

    let builds = FakeBuilds::new(build_record(10_000.0, None), "");
    fetch_build_info(&builds, &BuiltOnHostIdentifier, "job/x", 1)
        .await
        .unwrap();
    assert_eq!(*builds.log_fetches.lock().unwrap(), 0);
}

#[tokio::test]
async fn in_progress_build_cannot_be_correlated() {
    let builds = FakeBuilds::new(build_record(0.0, None), CONSOLE_LOG);
    let telemetry = FakeTelemetry::new(default_series());
    let correlator = Correlator::new(builds, telemetry, correlation_config());

    let err = correlator.correlate_at("job/x", 1, NOW).await.unwrap_err();
    assert!(matches!(err, CorrelationError::NotFound { ref what, .. } if what == "build duration"));
}

#[test]
fn metric_query_converts_window_end_to_milliseconds() {
    let metrics = vec!["cpu.used".to_string()];
    let q = MetricQuery::for_host("agent-7", &metrics, &TimeWindow::new(1_620_000_035, 90_000), 1);
    assert_eq!(q.filter, "entity.host.name:agent-7");
    assert_eq!(q.to_ms, 1_620_000_125_000);
    assert_eq!(q.window_size_ms, 90_000);
    assert_eq!(q.rollup_secs, 1);
    assert_eq!(q.metrics, metrics);
}
