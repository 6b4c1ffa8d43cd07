// Instana infrastructure metrics and snapshots (API token auth)

mod wire;

use reqwest::{Client, RequestBuilder, Url};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::config::MonitoringConfig;
use crate::correlation::{MetricQuery, SnapshotQuery, TelemetrySource};
use crate::error::{CorrelationError, Result};
use crate::http::{build_client, decode_json, transport_error};
use crate::models::{MetricSample, RawMetricSeries, TimeWindow};
use wire::{
    CombinedMetricsRequest, MetricsResponse, SnapshotResponse, SnapshotsResponse, TimeFrame,
};

const SERVICE: &str = "instana";
const HOST_PLUGIN: &str = "host";
const SNAPSHOT_SEARCH_SIZE: &str = "10";

pub struct InstanaRepo {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl InstanaRepo {
    pub fn connect(config: &MonitoringConfig) -> anyhow::Result<Self> {
        let endpoint = config.endpoint();
        let base_url = Url::parse(&endpoint)?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "monitoring endpoint is not a valid base URL: {}",
            endpoint
        );
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CorrelationError::upstream(SERVICE, format!("{} is not a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "infrastructure-monitoring"])
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(
            reqwest::header::AUTHORIZATION,
            format!("apiToken {}", self.api_key),
        )
    }
}

/// One series per (item, metric). Null points are gaps and are dropped.
fn into_series(resp: MetricsResponse) -> Vec<RawMetricSeries> {
    let mut out = Vec::new();
    for item in resp.items {
        debug!(label = ?item.label, host = ?item.host, metrics = item.metrics.len(), "metric item");
        for (name, points) in item.metrics {
            let samples = points
                .into_iter()
                .filter_map(|(ts, v)| v.map(|v| MetricSample::new(ts as i64, v)))
                .filter(|s| s.value.is_finite())
                .collect();
            out.push(RawMetricSeries::new(name, samples));
        }
    }
    out
}

impl TelemetrySource for InstanaRepo {
    #[instrument(skip(self), fields(repo = "instana", operation = "fetch_metrics"))]
    async fn fetch_metrics(&self, query: &MetricQuery) -> Result<Vec<RawMetricSeries>> {
        let body = CombinedMetricsRequest {
            metrics: &query.metrics,
            plugin: HOST_PLUGIN,
            query: &query.filter,
            time_frame: TimeFrame {
                to: query.to_ms,
                window_size: query.window_size_ms,
            },
            rollup: query.rollup_secs,
        };
        let resp = self
            .authorize(self.client.post(self.url(&["metrics"])?))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let metrics: MetricsResponse = decode_json(SERVICE, "host metrics", resp).await?;
        Ok(into_series(metrics))
    }

    #[instrument(skip(self), fields(repo = "instana", operation = "search_snapshots"))]
    async fn search_snapshots(&self, query: &SnapshotQuery) -> Result<Vec<String>> {
        let mut url = self.url(&["snapshots"])?;
        url.query_pairs_mut()
            .append_pair("offline", "true")
            .append_pair("plugin", HOST_PLUGIN)
            .append_pair("query", &query.filter)
            .append_pair("to", &query.to_ms.to_string())
            .append_pair("windowSize", &query.window_size_ms.to_string())
            .append_pair("size", SNAPSHOT_SEARCH_SIZE);
        let resp = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let found: SnapshotsResponse = decode_json(SERVICE, "snapshot search", resp).await?;
        Ok(found.items.into_iter().map(|i| i.snapshot_id).collect())
    }

    #[instrument(skip(self), fields(repo = "instana", operation = "fetch_snapshot_data"))]
    async fn fetch_snapshot_data(
        &self,
        snapshot_id: &str,
        window: &TimeWindow,
    ) -> Result<Map<String, Value>> {
        let mut url = self.url(&["snapshots", snapshot_id])?;
        url.query_pairs_mut()
            .append_pair("to", &window.to_ms().to_string())
            .append_pair("windowSize", &window.window_duration_ms.to_string());
        let resp = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let snapshot: SnapshotResponse = decode_json(SERVICE, "snapshot", resp).await?;
        snapshot.data.ok_or_else(|| {
            CorrelationError::schema(format!("snapshot {} has no data", snapshot_id))
        })
    }
}
