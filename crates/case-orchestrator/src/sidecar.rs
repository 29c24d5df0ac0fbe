//! Scoring sidecar client.
//!
//! The sidecar exposes `/dedupe`, `/score` and `/route` (POST, body
//! `{"mepp": <case>}`) and `/simulate_ulb_status?ticket_id=` (GET). Every
//! response is decoded leniently; only transport failures, non-success
//! statuses and non-JSON bodies are errors.

use std::time::Duration;

use async_trait::async_trait;
use civic_coordination::{Case, CredibilityScore, DedupeVerdict, RoutingDecision};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Timeout for dedupe / score / route calls.
pub const SCORING_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for ticket status polls.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("{endpoint} returned a non-JSON body: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Abstraction over the scoring sidecar.
///
/// `HttpSidecar` talks to the real service; tests provide in-process fakes.
#[async_trait]
pub trait SidecarApi: Send + Sync {
    async fn dedupe(&self, case: &Case) -> Result<DedupeVerdict, SidecarError>;

    async fn score(&self, case: &Case) -> Result<CredibilityScore, SidecarError>;

    async fn route(&self, case: &Case) -> Result<RoutingDecision, SidecarError>;

    /// Current status of a filed ticket, `None` when the body carries none.
    async fn ticket_status(&self, ticket_id: &str) -> Result<Option<String>, SidecarError>;
}

#[derive(Serialize)]
struct CaseEnvelope<'a> {
    mepp: &'a Case,
}

/// HTTP client for the sidecar.
pub struct HttpSidecar {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSidecar {
    /// `base_url` like `http://localhost:8000`; a trailing slash is trimmed.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_case(&self, path: &str, case: &Case) -> Result<Value, SidecarError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST to sidecar");
        let request = self
            .client
            .post(&url)
            .timeout(SCORING_TIMEOUT)
            .json(&CaseEnvelope { mepp: case });
        read_json(path, request).await
    }
}

async fn read_json(endpoint: &str, request: reqwest::RequestBuilder) -> Result<Value, SidecarError> {
    let resp = request
        .send()
        .await
        .map_err(|source| SidecarError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SidecarError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    resp.json::<Value>()
        .await
        .map_err(|source| SidecarError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}

#[async_trait]
impl SidecarApi for HttpSidecar {
    async fn dedupe(&self, case: &Case) -> Result<DedupeVerdict, SidecarError> {
        let body = self.post_case("/dedupe", case).await?;
        Ok(DedupeVerdict::from_value(&body))
    }

    async fn score(&self, case: &Case) -> Result<CredibilityScore, SidecarError> {
        let body = self.post_case("/score", case).await?;
        Ok(CredibilityScore::from_value(&body))
    }

    async fn route(&self, case: &Case) -> Result<RoutingDecision, SidecarError> {
        let body = self.post_case("/route", case).await?;
        Ok(RoutingDecision::from_value(&body))
    }

    async fn ticket_status(&self, ticket_id: &str) -> Result<Option<String>, SidecarError> {
        let endpoint = "/simulate_ulb_status";
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self
            .client
            .get(&url)
            .timeout(POLL_TIMEOUT)
            .query(&[("ticket_id", ticket_id)]);
        let body = read_json(endpoint, request).await?;
        Ok(body
            .get("status")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }
}
