// Correlated report: build info + host telemetry for the same interval

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AggregatedMetric, BuildInfo, HostSnapshot, TimeWindow, WindowKind};

/// Output of one successful correlation run. There is no partial form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationReport {
    pub build: BuildInfo,
    pub window_kind: WindowKind,
    pub window: TimeWindow,
    pub rollup_secs: u32,
    pub metrics: Vec<AggregatedMetric>,
    pub host: HostSnapshot,
}

impl fmt::Display for CorrelationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.build)?;
        writeln!(
            f,
            "Telemetry window: {} seconds ({:?}), rollup {}s",
            self.window.duration_secs(),
            self.window_kind,
            self.rollup_secs
        )?;
        for m in &self.metrics {
            let unit = m.scale.suffix();
            writeln!(
                f,
                "Metric: {}\n  average={:.2}{unit}\n  min={:.2}{unit}\n  max={:.2}{unit}",
                m.metric_name, m.average, m.min, m.max
            )?;
        }
        writeln!(f, "CPUs: {}", self.host.cpu_count)?;
        write!(f, "Memory (MB): {}", self.host.memory_mb())
    }
}
