// CI-side models: job location, raw build metadata, derived build info

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A job located inside nested folders, e.g. leaf `c` under `["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPath {
    pub leaf_name: String,
    /// Root-to-immediate-parent order.
    pub parent_segments: Vec<String>,
}

impl fmt::Display for JobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.parent_segments {
            write!(f, "{}/", p)?;
        }
        write!(f, "{}", self.leaf_name)
    }
}

/// Which build of a job to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSelector {
    LastSuccessful,
    Number(u64),
}

impl BuildSelector {
    /// Build id 0 means "most recent successful".
    pub fn from_id(id: u64) -> Self {
        if id == 0 {
            BuildSelector::LastSuccessful
        } else {
            BuildSelector::Number(id)
        }
    }
}

impl fmt::Display for BuildSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildSelector::LastSuccessful => write!(f, "last successful build"),
            BuildSelector::Number(n) => write!(f, "build #{}", n),
        }
    }
}

/// Build metadata as reported by the CI service, before any derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub job_name: String,
    pub build_id: u64,
    /// Scheduling time, milliseconds since the epoch.
    pub scheduled_timestamp_ms: i64,
    /// Total duration (queue + execution); reported as a float by the CI API.
    pub duration_ms: f64,
    /// Time spent executing on the agent, when the CI service reports it.
    pub execution_time_ms: Option<i64>,
    /// Agent name from structured metadata, when present.
    pub built_on: Option<String>,
}

/// Build metadata with derived absolute times. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub job_name: String,
    pub build_id: u64,
    pub scheduled_timestamp: DateTime<Utc>,
    pub duration_ms: Option<i64>,
    pub execution_time_ms: Option<i64>,
    /// `scheduled + duration/1000`, whole seconds.
    pub completed_time_unix: Option<i64>,
    /// `scheduled + (duration - execution)/1000`, whole seconds.
    pub execution_start_time_unix: Option<i64>,
    pub agent_host_machine: String,
}

impl BuildInfo {
    pub fn scheduled_time_unix(&self) -> i64 {
        self.scheduled_timestamp.timestamp()
    }
}

fn local_time(unix: Option<i64>) -> String {
    unix.and_then(|t| DateTime::from_timestamp(t, 0))
        .map(|t| t.with_timezone(&Local).to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn whole_seconds(ms: Option<i64>) -> String {
    ms.map(|v| (v / 1000).to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Project Name: {}", self.job_name)?;
        writeln!(f, "  Build ID: #{}", self.build_id)?;
        writeln!(f, "  Host: {}", self.agent_host_machine)?;
        writeln!(
            f,
            "  Scheduled at: {}",
            self.scheduled_timestamp.with_timezone(&Local)
        )?;
        writeln!(
            f,
            "  Began executing at: {}",
            local_time(self.execution_start_time_unix)
        )?;
        writeln!(f, "  Ended: {}", local_time(self.completed_time_unix))?;
        writeln!(
            f,
            "  Execution Time(s): {}",
            whole_seconds(self.execution_time_ms)
        )?;
        write!(f, "  Total Duration(s): {}", whole_seconds(self.duration_ms))
    }
}
