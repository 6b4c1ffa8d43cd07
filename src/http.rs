// Shared response handling for the Jenkins and Instana clients:
// 404 -> NotFound, other failures -> Upstream, bad JSON -> SchemaMismatch.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{CorrelationError, Result};
use crate::version::user_agent;

pub(crate) fn build_client(timeout_secs: u64) -> anyhow::Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent())
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

pub(crate) fn transport_error(service: &str, e: reqwest::Error) -> CorrelationError {
    CorrelationError::upstream(service, e.to_string())
}

/// Maps non-success statuses to typed errors. `what` names the looked-up entity.
pub(crate) async fn check_status(service: &str, what: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    if status == StatusCode::NOT_FOUND {
        return Err(CorrelationError::not_found(what, url));
    }
    let body = resp.text().await.unwrap_or_default();
    let body = body.trim();
    Err(CorrelationError::upstream(
        service,
        if body.is_empty() {
            format!("{} returned {}", url, status)
        } else {
            format!("{} returned {}: {}", url, status, body)
        },
    ))
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    service: &str,
    what: &str,
    resp: Response,
) -> Result<T> {
    let resp = check_status(service, what, resp).await?;
    let body = resp
        .text()
        .await
        .map_err(|e| transport_error(service, e))?;
    serde_json::from_str(&body)
        .map_err(|e| CorrelationError::schema(format!("{} payload from {}: {}", what, service, e)))
}
