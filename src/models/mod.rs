// Value objects owned by a single correlation run

mod build;
mod metric;
mod report;
mod window;

pub use build::{BuildInfo, BuildRecord, BuildSelector, JobPath};
pub use metric::{AggregatedMetric, HostSnapshot, MetricSample, MetricScale, RawMetricSeries};
pub use report::CorrelationReport;
pub use window::{TimeWindow, WindowKind};
