// Reduce raw metric series to min/max/average summaries.
// The API reports utilization as a 0..1 fraction; the scaling table below is
// the only place that knows which metrics are percentages.

use crate::error::{CorrelationError, Result};
use crate::models::{AggregatedMetric, MetricScale, RawMetricSeries};

/// Host metrics requested when none are configured.
pub const DEFAULT_METRICS: [&str; 3] = ["cpu.used", "load.1min", "memory.used"];

/// Metric name -> scaling policy. Names not listed are reported raw.
const METRIC_SCALES: &[(&str, MetricScale)] = &[
    ("cpu.used", MetricScale::Percent),
    ("memory.used", MetricScale::Percent),
    ("load.1min", MetricScale::Raw),
    ("load.5min", MetricScale::Raw),
    ("load.15min", MetricScale::Raw),
];

pub fn scale_for(metric_name: &str) -> MetricScale {
    METRIC_SCALES
        .iter()
        .find(|(name, _)| *name == metric_name)
        .map(|&(_, scale)| scale)
        .unwrap_or(MetricScale::Raw)
}

/// Summarizes one series. Fails with `EmptySeries` rather than reporting 0/0,
/// and with `SchemaMismatch` on a NaN or infinite sample.
pub fn aggregate_series(series: &RawMetricSeries) -> Result<AggregatedMetric> {
    if series.samples.is_empty() {
        return Err(CorrelationError::EmptySeries {
            metric: series.metric_name.clone(),
        });
    }

    let mut sum = 0.0_f64;
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for s in &series.samples {
        if !s.value.is_finite() {
            return Err(CorrelationError::schema(format!(
                "metric {} has non-finite sample {} at {}",
                series.metric_name, s.value, s.timestamp_ms
            )));
        }
        sum += s.value;
        min = min.min(s.value);
        max = max.max(s.value);
    }
    let count = series.samples.len();
    // sum / count can round just outside [min, max] when all samples are equal
    let average = (sum / count as f64).clamp(min, max);

    let scale = scale_for(&series.metric_name);
    let factor = scale.factor();
    Ok(AggregatedMetric {
        metric_name: series.metric_name.clone(),
        min: min * factor,
        max: max * factor,
        average: average * factor,
        sample_count: count,
        scale,
    })
}

/// One summary per input series, in input order.
pub fn aggregate_all(series: &[RawMetricSeries]) -> Result<Vec<AggregatedMetric>> {
    series.iter().map(aggregate_series).collect()
}

/// Summaries for the requested metrics, in request order. A requested metric
/// that the backend returned no series for counts as empty. When several
/// series carry the same name, their samples are pooled.
pub fn aggregate_requested(
    requested: &[String],
    series: &[RawMetricSeries],
) -> Result<Vec<AggregatedMetric>> {
    requested
        .iter()
        .map(|name| {
            let samples = series
                .iter()
                .filter(|s| &s.metric_name == name)
                .flat_map(|s| s.samples.iter().copied())
                .collect();
            aggregate_series(&RawMetricSeries::new(name.clone(), samples))
        })
        .collect()
}
