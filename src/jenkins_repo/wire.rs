// Jenkins JSON API payloads (only the fields we read)

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobJson {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildJson {
    pub number: u64,
    pub timestamp: i64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub built_on: Option<String>,
    /// Heterogeneous action objects; entries may be `{}` or null.
    #[serde(default)]
    pub actions: Vec<Value>,
}

impl BuildJson {
    /// `executingTimeMillis` of the metrics plugin's TimeInQueueAction, if reported.
    pub(crate) fn execution_time_ms(&self) -> Option<i64> {
        self.actions
            .iter()
            .filter(|a| {
                a.get("_class")
                    .and_then(Value::as_str)
                    .is_some_and(|c| c.ends_with("TimeInQueueAction"))
            })
            .find_map(|a| a.get("executingTimeMillis").and_then(Value::as_i64))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateCenterJson {
    #[serde(default)]
    pub restart_required_for_completion: bool,
}
