// Jenkins build metadata and plugin management via the JSON API (basic auth with API token)

pub mod plugins;
mod wire;

use reqwest::{Client, RequestBuilder, Url};
use tracing::instrument;

use crate::config::CiConfig;
use crate::correlation::BuildSource;
use crate::error::{CorrelationError, Result};
use crate::http::{build_client, check_status, decode_json, transport_error};
use crate::models::{BuildRecord, BuildSelector, JobPath};
use wire::{BuildJson, JobJson};

pub(crate) const SERVICE: &str = "jenkins";

pub struct JenkinsRepo {
    client: Client,
    base_url: Url,
    user: String,
    api_token: String,
}

impl JenkinsRepo {
    pub fn connect(config: &CiConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(config.url.trim())?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "ci.url is not a valid base URL: {}",
            config.url
        );
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url,
            user: config.user.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// `{base}/job/a/job/b/job/<leaf>/<tail...>`; segments are percent-encoded.
    fn job_url(&self, job: &JobPath, tail: &[&str]) -> Result<Url> {
        let mut segments: Vec<&str> = Vec::with_capacity(2 * job.parent_segments.len() + 2);
        for p in &job.parent_segments {
            segments.push("job");
            segments.push(p);
        }
        segments.push("job");
        segments.push(&job.leaf_name);
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CorrelationError::upstream(SERVICE, format!("{} is not a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.user, Some(&self.api_token))
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.client
            .post(url)
            .basic_auth(&self.user, Some(&self.api_token))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let resp = self
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        decode_json(SERVICE, what, resp).await
    }
}

fn selector_segment(selector: BuildSelector) -> String {
    match selector {
        BuildSelector::LastSuccessful => "lastSuccessfulBuild".to_string(),
        BuildSelector::Number(n) => n.to_string(),
    }
}

impl BuildSource for JenkinsRepo {
    #[instrument(skip(self), fields(repo = "jenkins", operation = "fetch_build"))]
    async fn fetch_build(&self, job: &JobPath, selector: BuildSelector) -> Result<BuildRecord> {
        let job_json: JobJson = self
            .get_json(self.job_url(job, &["api", "json"])?, "job")
            .await?;

        let build_segment = selector_segment(selector);
        let build: BuildJson = self
            .get_json(self.job_url(job, &[build_segment.as_str(), "api", "json"])?, "build")
            .await?;

        let execution_time_ms = build.execution_time_ms();
        Ok(BuildRecord {
            job_name: job_json
                .full_name
                .or(job_json.name)
                .unwrap_or_else(|| job.to_string()),
            build_id: build.number,
            scheduled_timestamp_ms: build.timestamp,
            duration_ms: build.duration,
            execution_time_ms,
            built_on: build.built_on,
        })
    }

    #[instrument(skip(self), fields(repo = "jenkins", operation = "fetch_console_log"))]
    async fn fetch_console_log(&self, job: &JobPath, build_id: u64) -> Result<String> {
        let build_segment = build_id.to_string();
        let url = self.job_url(job, &[build_segment.as_str(), "consoleText"])?;
        let resp = self
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let resp = check_status(SERVICE, "console log", resp).await?;
        resp.text().await.map_err(|e| transport_error(SERVICE, e))
    }
}
