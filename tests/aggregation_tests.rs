// Aggregation: min/max/average per series, percentage scaling, empty series

use buildscope::correlation::aggregation::{aggregate_all, aggregate_requested, aggregate_series};
use buildscope::error::CorrelationError;
use buildscope::models::{MetricScale, RawMetricSeries};

#[test]
fn raw_series_min_max_average() {
    let s = RawMetricSeries::from_pairs("load.1min", &[(0, 10.0), (1, 20.0), (2, 30.0)]);
    let m = aggregate_series(&s).unwrap();
    assert_eq!(m.min, 10.0);
    assert_eq!(m.max, 30.0);
    assert_eq!(m.average, 20.0);
    assert_eq!(m.sample_count, 3);
    assert_eq!(m.scale, MetricScale::Raw);
}

#[test]
fn unknown_metric_is_unscaled() {
    let s = RawMetricSeries::from_pairs("disk.io", &[(0, 10.0), (1, 20.0), (2, 30.0)]);
    let m = aggregate_series(&s).unwrap();
    assert_eq!((m.min, m.max, m.average), (10.0, 30.0, 20.0));
}

#[test]
fn percentage_metrics_are_scaled() {
    let s = RawMetricSeries::from_pairs("cpu.used", &[(0, 0.25), (1, 0.5), (2, 0.75)]);
    let m = aggregate_series(&s).unwrap();
    assert_eq!(m.min, 25.0);
    assert_eq!(m.max, 75.0);
    assert_eq!(m.average, 50.0);
    assert_eq!(m.scale, MetricScale::Percent);

    let s = RawMetricSeries::from_pairs("memory.used", &[(0, 0.5)]);
    assert_eq!(aggregate_series(&s).unwrap().average, 50.0);
}

#[test]
fn empty_series_is_an_error_not_zero() {
    let s = RawMetricSeries::new("cpu.used", vec![]);
    let err = aggregate_series(&s).unwrap_err();
    assert_eq!(
        err,
        CorrelationError::EmptySeries {
            metric: "cpu.used".into()
        }
    );
}

#[test]
fn single_sample_min_max_average_equal() {
    for v in [0.0, 3.5, 42.0] {
        let s = RawMetricSeries::from_pairs("load.1min", &[(1_000, v)]);
        let m = aggregate_series(&s).unwrap();
        assert_eq!(m.min, v);
        assert_eq!(m.max, v);
        assert_eq!(m.average, v);
    }
}

#[test]
fn average_between_min_and_max() {
    let s = RawMetricSeries::from_pairs(
        "load.5min",
        &[(0, 0.3), (1, 7.1), (2, 2.2), (3, 0.0), (4, 5.5)],
    );
    let m = aggregate_series(&s).unwrap();
    assert!(m.min <= m.average && m.average <= m.max);
    assert_eq!(m.min, 0.0);
    assert_eq!(m.max, 7.1);
}

#[test]
fn repeated_values_keep_average_within_range() {
    let s = RawMetricSeries::from_pairs("load.1min", &[(0, 0.1), (1, 0.1), (2, 0.1)]);
    let m = aggregate_series(&s).unwrap();
    assert!(m.min <= m.average && m.average <= m.max, "{m:?}");
    assert_eq!(m.average, 0.1);

    let s = RawMetricSeries::from_pairs("cpu.used", &[(0, 0.7), (1, 0.7), (2, 0.7)]);
    let m = aggregate_series(&s).unwrap();
    assert_eq!(m.scale, MetricScale::Percent);
    assert!(m.min <= m.average && m.average <= m.max, "{m:?}");
    assert_eq!(m.average, m.min);
    assert_eq!(m.average, m.max);
}

#[test]
fn non_finite_sample_is_rejected() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let s = RawMetricSeries::from_pairs("cpu.used", &[(0, 0.5), (1, bad), (2, 0.25)]);
        let err = aggregate_series(&s).unwrap_err();
        assert!(matches!(err, CorrelationError::SchemaMismatch { .. }), "{err:?}");
    }
}

#[test]
fn aggregate_all_keeps_input_order() {
    let series = vec![
        RawMetricSeries::from_pairs("memory.used", &[(0, 0.1)]),
        RawMetricSeries::from_pairs("cpu.used", &[(0, 0.2)]),
    ];
    let out = aggregate_all(&series).unwrap();
    let names: Vec<_> = out.iter().map(|m| m.metric_name.as_str()).collect();
    assert_eq!(names, vec!["memory.used", "cpu.used"]);
}

#[test]
fn aggregate_all_fails_on_any_empty_series() {
    let series = vec![
        RawMetricSeries::from_pairs("cpu.used", &[(0, 0.2)]),
        RawMetricSeries::new("load.1min", vec![]),
    ];
    assert!(matches!(
        aggregate_all(&series),
        Err(CorrelationError::EmptySeries { metric }) if metric == "load.1min"
    ));
}

#[test]
fn requested_metric_missing_from_response_is_empty() {
    let series = vec![RawMetricSeries::from_pairs("cpu.used", &[(0, 0.2)])];
    let requested = vec!["cpu.used".to_string(), "memory.used".to_string()];
    assert!(matches!(
        aggregate_requested(&requested, &series),
        Err(CorrelationError::EmptySeries { metric }) if metric == "memory.used"
    ));
}

#[test]
fn requested_metrics_follow_request_order_and_pool_duplicates() {
    let series = vec![
        RawMetricSeries::from_pairs("load.1min", &[(0, 1.0)]),
        RawMetricSeries::from_pairs("cpu.used", &[(0, 0.2)]),
        RawMetricSeries::from_pairs("load.1min", &[(1, 3.0)]),
    ];
    let requested = vec!["cpu.used".to_string(), "load.1min".to_string()];
    let out = aggregate_requested(&requested, &series).unwrap();
    assert_eq!(out[0].metric_name, "cpu.used");
    assert_eq!(out[1].metric_name, "load.1min");
    assert_eq!(out[1].sample_count, 2);
    assert_eq!(out[1].average, 2.0);
}
