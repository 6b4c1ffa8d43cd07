// Build timing: derive completion and execution start from reported durations.
// All derived times are whole seconds; sub-second remainders are truncated
// because the monitoring API's finest granularity is one second.

use chrono::DateTime;

use crate::error::{CorrelationError, Result};
use crate::models::{BuildInfo, BuildRecord, TimeWindow, WindowKind};

/// Derives absolute build times from raw CI metadata.
///
/// A duration that is zero, negative or not finite (e.g. a build still in
/// progress) is treated as unknown, which leaves both derived times absent.
/// An execution time of zero is likewise unknown.
pub fn derive_build_info(record: &BuildRecord, agent_host_machine: String) -> Result<BuildInfo> {
    let scheduled_timestamp = DateTime::from_timestamp_millis(record.scheduled_timestamp_ms)
        .ok_or_else(|| {
            CorrelationError::schema(format!(
                "build timestamp {} is out of range",
                record.scheduled_timestamp_ms
            ))
        })?;
    let scheduled_unix = scheduled_timestamp.timestamp();

    let duration_ms = round_duration(record.duration_ms);
    let execution_time_ms = record.execution_time_ms.filter(|&ms| ms > 0);

    let completed_time_unix = duration_ms.map(|d| scheduled_unix + d / 1000);
    let execution_start_time_unix = match (duration_ms, execution_time_ms) {
        (Some(d), Some(e)) => Some(scheduled_unix + (d - e) / 1000),
        _ => None,
    };

    Ok(BuildInfo {
        job_name: record.job_name.clone(),
        build_id: record.build_id,
        scheduled_timestamp,
        duration_ms,
        execution_time_ms,
        completed_time_unix,
        execution_start_time_unix,
        agent_host_machine,
    })
}

fn round_duration(ms: f64) -> Option<i64> {
    if !ms.is_finite() {
        return None;
    }
    let rounded = ms.round();
    (rounded >= 1.0).then_some(rounded as i64)
}

/// Picks the telemetry window for a build. `Execution` falls back to `Total`
/// when execution time is unknown; the returned kind says which was used.
pub fn telemetry_window(info: &BuildInfo, kind: WindowKind) -> Result<(WindowKind, TimeWindow)> {
    let duration_ms = info.duration_ms.ok_or_else(|| {
        CorrelationError::not_found(
            "build duration",
            format!(
                "{} #{} has not completed or reports no duration",
                info.job_name, info.build_id
            ),
        )
    })?;

    if kind == WindowKind::Execution
        && let (Some(start), Some(exec_ms)) =
            (info.execution_start_time_unix, info.execution_time_ms)
    {
        return Ok((
            WindowKind::Execution,
            TimeWindow::new(start, exec_ms.max(0) as u64),
        ));
    }

    Ok((
        WindowKind::Total,
        TimeWindow::new(info.scheduled_time_unix(), duration_ms.max(0) as u64),
    ))
}
