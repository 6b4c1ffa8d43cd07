// Host configuration snapshot: search by host + window, then read the
// snapshot's loosely-typed configuration map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{SnapshotQuery, TelemetrySource};
use crate::error::{CorrelationError, Result};
use crate::models::{HostSnapshot, TimeWindow};

const CPU_COUNT_KEY: &str = "cpu.count";
const MEMORY_TOTAL_KEY: &str = "memory.total";

/// What to do when more than one snapshot matches the host filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSelection {
    /// Take the first match in the backend's order, with a warning.
    #[default]
    First,
    /// Fail with `Ambiguous`.
    Unique,
}

pub fn select_snapshot<'a>(
    snapshot_ids: &'a [String],
    host: &str,
    policy: SnapshotSelection,
) -> Result<&'a str> {
    match snapshot_ids {
        [] => Err(CorrelationError::not_found(
            "host snapshot",
            format!("no snapshot matches host {}", host),
        )),
        [only] => Ok(only.as_str()),
        [first, ..] => match policy {
            SnapshotSelection::First => {
                warn!(
                    host,
                    matches = snapshot_ids.len(),
                    snapshot_id = %first,
                    "several snapshots match host; using the first"
                );
                Ok(first.as_str())
            }
            SnapshotSelection::Unique => Err(CorrelationError::Ambiguous {
                what: format!("snapshot for host {}", host),
                count: snapshot_ids.len(),
            }),
        },
    }
}

/// Reads CPU count and total memory from a snapshot's configuration map.
pub fn extract_host_snapshot(data: &Map<String, Value>) -> Result<HostSnapshot> {
    let cpu_count = read_count(data, CPU_COUNT_KEY)?;
    let cpu_count = u32::try_from(cpu_count).map_err(|_| {
        CorrelationError::schema(format!("{} out of range: {}", CPU_COUNT_KEY, cpu_count))
    })?;
    let memory_bytes = read_count(data, MEMORY_TOTAL_KEY)?;
    Ok(HostSnapshot {
        cpu_count,
        memory_bytes,
    })
}

/// The API encodes these as JSON numbers, sometimes with a fractional part.
fn read_count(data: &Map<String, Value>, key: &str) -> Result<u64> {
    let value = data
        .get(key)
        .ok_or_else(|| CorrelationError::schema(format!("snapshot data has no {}", key)))?;
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => Ok(f as u64),
        _ => Err(CorrelationError::schema(format!(
            "{} is not a non-negative number: {}",
            key, value
        ))),
    }
}

/// Resolves host + window to the host's static configuration.
pub async fn resolve_host_snapshot<T: TelemetrySource>(
    telemetry: &T,
    host: &str,
    window: &TimeWindow,
    policy: SnapshotSelection,
) -> Result<HostSnapshot> {
    let query = SnapshotQuery::for_host(host, window);
    let ids = telemetry.search_snapshots(&query).await?;
    let snapshot_id = select_snapshot(&ids, host, policy)?;
    debug!(host, snapshot_id, "fetching snapshot configuration");
    let data = telemetry.fetch_snapshot_data(snapshot_id, window).await?;
    extract_host_snapshot(&data)
}
