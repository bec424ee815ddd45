//! Upstream executor, the one place lookup features touch the network.
//!
//! Callers describe a request with `UpstreamRequest`; `HttpUpstream` runs it
//! with a bounded client timeout. Nothing here retries: a failure goes
//! straight back to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream request failed (status {status})")]
    Status { status: u16 },

    #[error("Upstream returned invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl UpstreamError {
    /// Upstream HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status } => Some(*status),
            UpstreamError::Http(e) => e.status().map(|s| s.as_u16()),
            UpstreamError::Parse(_) => None,
        }
    }
}

/// Address plus query pairs of a single upstream GET.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }
}

/// Raw upstream reply. The body is only parsed on success.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, UpstreamError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Capability to run one upstream call. `AppState` carries an
/// `Arc<dyn Upstream>` so tests can substitute canned responses.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn execute(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn execute(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Upstream {} returned {status}", request.url);

        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_keeps_param_order() {
        let req = UpstreamRequest::get("https://example.invalid/words")
            .param("max", "25")
            .param("ml", "lava");
        assert_eq!(
            req.query,
            vec![
                ("max".to_string(), "25".to_string()),
                ("ml".to_string(), "lava".to_string())
            ]
        );
    }

    #[test]
    fn test_success_range() {
        let ok = UpstreamResponse {
            status: 204,
            body: String::new(),
        };
        let missing = UpstreamResponse {
            status: 404,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_status_error_exposes_status() {
        assert_eq!(UpstreamError::Status { status: 503 }.status(), Some(503));
    }
}
