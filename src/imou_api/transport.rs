//! HTTP transport seam
//!
//! The Open API core only needs "POST this JSON, give me status, Date header
//! and body". `ReqwestTransport` is the production implementation; tests plug
//! in scripted fakes.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Default total timeout per request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw HTTP response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Server `Date` header, used for usage metering
    pub date: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            date: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// JSON POST transport
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse>;
}

/// reqwest-backed transport sharing one connection pool
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse> {
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Transport(format!("POST {} timed out", url))
            } else {
                Error::Transport(format!("POST {} failed: {}", url, e))
            }
        })?;

        let status = response.status().as_u16();
        let date = response
            .headers()
            .get(reqwest::header::DATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read body from {}: {}", url, e)))?;

        Ok(TransportResponse { status, date, body })
    }
}
