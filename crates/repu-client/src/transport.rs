use async_trait::async_trait;
use reqwest::{Client, Method};
use repu_error::{RepuError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

use crate::config::{ClientConfig, REQUEST_TIMEOUT};

/// A request after the outbound stage: sanitized query, headers attached.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body as received, before the inbound stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse>;
}

// ========== reqwest ==========

#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    cfg: ClientConfig,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RepuError::Configuration {
                key: "http_client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            cfg,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Use a prebuilt client. `timeout` must be the one it was built with.
    pub fn with_client(http: Client, cfg: ClientConfig, timeout: Duration) -> Self {
        Self { http, cfg, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse> {
        let operation = format!("{} {}", request.method, request.path);
        let mut builder = self
            .http
            .request(request.method, self.cfg.url(&request.path))
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| self.transport_error(&operation, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(&operation, e))?;

        Ok(RawResponse { status, body })
    }
}

impl HttpTransport {
    fn transport_error(&self, operation: &str, err: reqwest::Error) -> RepuError {
        if err.is_timeout() {
            RepuError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            RepuError::Network {
                operation: operation.to_string(),
                message: err.to_string(),
            }
        }
    }
}
