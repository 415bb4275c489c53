use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::api::JobApi;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::stage::StageKind;
use crate::types::{SubmitResponse, TaskStatus};

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Async HTTP client for the generation server.
///
/// Every stage request is scoped by a `project_id` query parameter. JSON
/// bodies with `success=false` come back as normal values; only transport
/// failures and non-2xx statuses are errors.
///
/// # Example
/// ```no_run
/// use reel_pipeline::{JobApi, ReelClient};
///
/// # async fn example() -> reel_pipeline::Result<()> {
/// let client = ReelClient::new("http://127.0.0.1:5000");
/// let project = client.create_project().await?;
/// println!("project {:?}", project.project_id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReelClient {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl ReelClient {
    /// Create a new client pointing at the given server.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(endpoint.into()),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.endpoint.clone()).with_timeout(config.request_timeout)
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ── Transport ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let resp = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PipelineError::Network {
                context: format!(
                    "Cannot reach generation server at {} \u{2014} is the service running?",
                    self.endpoint
                ),
                source: e,
            })?;
        Self::decode(resp, what).await
    }

    async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Http { status, body });
        }

        let text = resp.text().await.map_err(|e| PipelineError::Network {
            context: format!("Failed to read {} response", what),
            source: e,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl JobApi for ReelClient {
    // ── Projects ───────────────────────────────────────────────────

    async fn create_project(&self) -> Result<SubmitResponse> {
        let request = self.http.post(self.url("/api/projects"));
        self.send(request, "project creation").await
    }

    // ── Stages ─────────────────────────────────────────────────────

    async fn submit(
        &self,
        stage: StageKind,
        project_id: &str,
        body: &Value,
    ) -> Result<SubmitResponse> {
        let mut request = self
            .http
            .post(self.url(stage.submit_path()))
            .query(&[("project_id", project_id)]);
        if !body.is_null() {
            request = request.json(body);
        }
        self.send(request, stage.as_str()).await
    }

    async fn status(&self, stage: StageKind, project_id: &str) -> Result<TaskStatus> {
        let path = stage.status_path().ok_or_else(|| {
            PipelineError::InvalidConfig(format!("{} stage has no status endpoint", stage))
        })?;
        let request = self
            .http
            .get(self.url(path))
            .query(&[("project_id", project_id)]);
        self.send(request, &format!("{} status", stage)).await
    }
}
